//! Console conversation loop

use crate::output::console::ConsoleFormatter;
use crate::progress::spinner::WaitSpinner;
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use relay_application::{ChatTurnUseCase, CompletionParams, FnSink};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Typing this line (in any case) ends the conversation.
pub const END_COMMAND: &str = "END";

fn is_end_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(END_COMMAND)
}

/// Interactive chat REPL for one participant in one condition
pub struct ChatRepl {
    turns: Arc<ChatTurnUseCase>,
    participant_id: String,
    params: CompletionParams,
    bot_name: String,
    task_active: AtomicBool,
    stream: bool,
    show_progress: bool,
}

impl ChatRepl {
    pub fn new(
        turns: Arc<ChatTurnUseCase>,
        participant_id: impl Into<String>,
        params: CompletionParams,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            turns,
            participant_id: participant_id.into(),
            params,
            bot_name: bot_name.into(),
            task_active: AtomicBool::new(true),
            stream: false,
            show_progress: true,
        }
    }

    /// Start with the study task already complete when `false`
    pub fn with_task_active(self, active: bool) -> Self {
        self.task_active.store(active, Ordering::Relaxed);
        self
    }

    /// Print replies fragment by fragment
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set whether to show the spinner for blocking replies
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run until the participant types `END` or closes input.
    pub async fn run(&self) {
        let mut editor = Reedline::create();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("You".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if is_end_command(line) {
                        println!("Conversation ended.");
                        break;
                    }
                    if line.starts_with('/') {
                        self.handle_command(line).await;
                        continue;
                    }
                    self.process_message(line).await;
                }
                Ok(_) => {
                    println!("Conversation ended.");
                    break;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    break;
                }
            }
        }
    }

    fn print_welcome(&self) {
        println!();
        println!(
            "Chatting with {}. Type {} to finish, /help for commands.",
            self.bot_name.bold(),
            END_COMMAND.bold()
        );
        println!();
    }

    async fn handle_command(&self, cmd: &str) {
        match cmd {
            "/done" => {
                self.task_active.store(false, Ordering::Relaxed);
                match self.turns.mark_task_inactive(&self.participant_id).await {
                    Ok(true) => println!("{}", "Task marked complete.".dimmed()),
                    Ok(false) => println!("{}", "Task already marked complete.".dimmed()),
                    Err(e) => eprintln!("{}", ConsoleFormatter::turn_error(&e)),
                }
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /done           - Mark the study task complete");
                println!("  /help, /h, /?   - Show this help");
                println!("  {:<15} - End the conversation", END_COMMAND);
                println!();
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
    }

    async fn process_message(&self, text: &str) {
        let task_active = self.task_active.load(Ordering::Relaxed);
        let result = if self.stream {
            print!("{} ", ConsoleFormatter::bot_label(&self.bot_name));
            let _ = std::io::stdout().flush();
            let mut sink = FnSink(|fragment: &str| {
                print!("{}", fragment);
                let _ = std::io::stdout().flush();
            });
            let result = self
                .turns
                .send_streaming(
                    &self.participant_id,
                    text,
                    task_active,
                    &self.params,
                    &mut sink,
                )
                .await;
            println!();
            result
        } else {
            let spinner = if self.show_progress {
                WaitSpinner::start(format!("{} is typing...", self.bot_name))
            } else {
                WaitSpinner::hidden()
            };
            let result = self
                .turns
                .send(&self.participant_id, text, task_active, &self.params)
                .await;
            spinner.finish();
            if let Ok(reply) = &result {
                println!("{}", ConsoleFormatter::reply(&self.bot_name, &reply.text));
            }
            result
        };

        if let Err(e) = result {
            eprintln!("{}", ConsoleFormatter::turn_error(&e));
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_command_ignores_case() {
        assert!(is_end_command("END"));
        assert!(is_end_command("end"));
        assert!(is_end_command(" End "));
        assert!(!is_end_command("the end"));
        assert!(!is_end_command("ending"));
    }
}
