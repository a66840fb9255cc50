use application::chat_service::{ChatService, SubmitOutcome};
use arboard::Clipboard;
use clap::Parser;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use domain::attachment::LocalAttachment;
use domain::message::Role;
use domain::session::SessionId;
use infrastructure::attachment;
use infrastructure::config::Config;
use infrastructure::gemini::GeminiClient;
use infrastructure::storage::BucketClient;
use shared::confirmation::ask_confirmation;
use shared::telemetry::Telemetry;
use shared::types::Result;

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}

#[derive(Parser)]
#[command(name = "banter")]
#[command(about = "Terminal chat for the Gemini API with file attachments")]
pub struct Cli {
    /// Attach a file to the first message (.txt, .pdf or an image)
    #[arg(long)]
    pub attach: Option<String>,

    /// Copy each reply to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// One-shot prompt; leave empty for interactive chat
    #[arg(trailing_var_arg = true)]
    pub prompt: Vec<String>,
}

pub struct ChatApp {
    service: ChatService<GeminiClient, BucketClient>,
    pending: Option<LocalAttachment>,
    copy_replies: bool,
}

impl ChatApp {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let provider = GeminiClient::new(&config);
        let storage = BucketClient::new(&config);
        Ok(Self {
            service: ChatService::new(provider, storage),
            pending: None,
            copy_replies: false,
        })
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        self.copy_replies = cli.copy;
        if let Some(path) = cli.attach.as_deref() {
            self.attach(path).await?;
        }
        let prompt_text = cli.prompt.join(" ");
        if prompt_text.trim().is_empty() {
            self.run_chat().await
        } else {
            self.run_one_shot(&prompt_text).await
        }
    }

    async fn run_one_shot(&mut self, text: &str) -> Result<()> {
        let attachment = self.pending.take();
        eprintln!("Thinking...");
        let timer = Telemetry::new();
        match self.service.submit(text, attachment.as_ref()).await? {
            SubmitOutcome::Replied { reply, .. } => {
                println!("{reply}");
                eprintln!("{}", format!("({})", timer.elapsed_display()).dimmed());
                if self.copy_replies {
                    copy_to_clipboard(&reply)?;
                }
            }
            SubmitOutcome::Skipped | SubmitOutcome::Discarded => {}
        }
        Ok(())
    }

    async fn run_chat(&mut self) -> Result<()> {
        println!("Chat mode. Type a message, /help for commands, or 'exit' to quit.");
        loop {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(self.prompt_label())
                .allow_empty(true)
                .interact_text()?;
            let line = input.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                break;
            }
            if let Some(command) = line.strip_prefix('/') {
                self.handle_command(command).await?;
                continue;
            }
            self.submit_turn(&line).await?;
        }
        Ok(())
    }

    /// Runs one user turn. Upload and inference failures are reported and the
    /// loop keeps going; only terminal errors bubble up.
    async fn submit_turn(&mut self, text: &str) -> Result<()> {
        let attachment = self.pending.take();
        eprintln!("Thinking...");
        let timer = Telemetry::new();
        match self.service.submit(text, attachment.as_ref()).await {
            Ok(SubmitOutcome::Replied { reply, .. }) => {
                println!("{} {}", "assistant:".green().bold(), reply);
                eprintln!("{}", format!("({})", timer.elapsed_display()).dimmed());
                if self.copy_replies {
                    if let Err(err) = copy_to_clipboard(&reply) {
                        eprintln!("{}", format!("Clipboard unavailable: {err}").yellow());
                    }
                }
            }
            Ok(SubmitOutcome::Skipped) => {}
            Ok(SubmitOutcome::Discarded) => {
                println!(
                    "{}",
                    "Reply arrived for a closed conversation; discarded.".yellow()
                );
            }
            Err(err) => {
                println!("{}", format!("Error: {err}").red());
            }
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: &str) -> Result<()> {
        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let argument = parts.next().unwrap_or("").trim();
        match name {
            "help" => self.print_help(),
            "new" => {
                self.service.new_chat();
                println!("{}", "Started a new conversation.".green());
            }
            "sessions" => self.show_sessions(),
            "open" => self.open_by_index(argument),
            "delete" => self.delete_by_index(argument)?,
            "attach" => {
                if argument.is_empty() {
                    println!("{}", "Usage: /attach <path>".yellow());
                } else if let Err(err) = self.attach(argument).await {
                    println!("{}", format!("Error: {err}").red());
                }
            }
            "detach" => self.detach(),
            _ => println!("{}", format!("Unknown command: /{name}. Try /help.").yellow()),
        }
        Ok(())
    }

    async fn attach(&mut self, path: &str) -> Result<()> {
        let loaded = attachment::load(path).await?;
        println!(
            "{}",
            format!(
                "Attached {} ({})",
                loaded.file_name,
                shared::utils::format_bytes(loaded.size())
            )
            .green()
        );
        if let Some(preview) = attachment::preview(&loaded) {
            println!(
                "{}",
                format!("Inline preview available ({} chars).", preview.len()).dimmed()
            );
        }
        self.pending = Some(loaded);
        Ok(())
    }

    fn detach(&mut self) {
        match self.pending.take() {
            Some(attachment) => {
                println!("{}", format!("Removed {}.", attachment.file_name).yellow());
            }
            None => println!("{}", "No attachment staged.".yellow()),
        }
    }

    fn show_sessions(&self) {
        if self.service.sessions().is_empty() {
            println!("{}", "No conversations yet.".yellow());
            return;
        }
        let active = self.service.active_session();
        for (i, session) in self.service.sessions().iter().enumerate() {
            let marker = if active == Some(session.id) { "*" } else { " " };
            println!(
                "{} {} {} {}",
                marker,
                format!("[{}]", i + 1).blue(),
                session.title,
                format!(
                    "({} messages, {})",
                    session.messages.len(),
                    session.created_at.format("%Y-%m-%d %H:%M")
                )
                .dimmed()
            );
        }
    }

    fn open_by_index(&mut self, argument: &str) {
        let Some(id) = self.session_at(argument) else {
            println!("{}", "Usage: /open <number> (see /sessions)".yellow());
            return;
        };
        match self.service.open_session(id).map(|_| ()) {
            Ok(()) => self.render_transcript(),
            Err(err) => println!("{}", format!("Error: {err}").red()),
        }
    }

    fn delete_by_index(&mut self, argument: &str) -> Result<()> {
        let Some(id) = self.session_at(argument) else {
            println!("{}", "Usage: /delete <number> (see /sessions)".yellow());
            return Ok(());
        };
        let title = self
            .service
            .sessions()
            .iter()
            .find(|session| session.id == id)
            .map(|session| session.title.clone())
            .unwrap_or_default();
        if !ask_confirmation(&format!("Delete \"{title}\"?"), false)? {
            println!("{}", "Kept the conversation.".yellow());
            return Ok(());
        }
        match self.service.delete_session(id) {
            Ok(()) => println!("{}", "Conversation deleted.".green()),
            Err(err) => println!("{}", format!("Error: {err}").red()),
        }
        Ok(())
    }

    fn render_transcript(&self) {
        for message in self.service.transcript() {
            let label = match message.role {
                Role::User => "you:".cyan().bold(),
                Role::Assistant => "assistant:".green().bold(),
            };
            println!("{label} {}", message.content);
            if let Some(url) = &message.file_url {
                println!("  {}", format!("[attachment: {url}]").dimmed());
            }
        }
    }

    fn session_at(&self, argument: &str) -> Option<SessionId> {
        let index: usize = argument.parse().ok()?;
        self.service
            .sessions()
            .get(index.checked_sub(1)?)
            .map(|session| session.id)
    }

    fn prompt_label(&self) -> String {
        match &self.pending {
            Some(attachment) => format!("you [{}]", attachment.file_name),
            None => "you".to_string(),
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  /new              start a new conversation");
        println!("  /sessions         list conversations");
        println!("  /open <number>    switch to a conversation");
        println!("  /delete <number>  delete a conversation");
        println!("  /attach <path>    stage a file for the next message");
        println!("  /detach           drop the staged file");
        println!("  exit              leave the chat");
    }
}
