//! Interactive element shell
//!
//! One line per command. The manager lives for the whole session, so local ids and
//! the edit session persist between commands.

use crate::render::{render_element, render_list, OutputFormat};
use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use element_manager_core::validate::parse_attribute_value;
use element_manager_core::{ElementManager, ElementRef, NoticeKind, Notifier};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub const HELP: &str = "\
list                 show the element list
reload               fetch the list from the catalog again
draft                show the new-element form
name <text>          set the form's name
set <key>=<value>    set a form field (JSON literals stay typed)
save                 validate and create the form's element
clear                reset the form
view <ref>           open an element for editing (<id> or #<local id>)
show                 show the working copy
rename <text>        rename the working copy
edit <key>=<value>   set a field on the working copy
unset <key>          remove a field from the working copy
revert               discard edits, keep the element open
commit               save the working copy and close
close                close without saving
delete <ref>         delete an element
help                 this text
quit                 leave the shell";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Reload,
    Draft,
    Name(String),
    Set { key: String, value: String },
    Save,
    Clear,
    View(ElementRef),
    Show,
    Rename(String),
    Edit { key: String, value: String },
    Unset(String),
    Revert,
    Commit,
    Close,
    Delete(ElementRef),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Nothing,
    Quit,
}

fn key_value(rest: &str, usage: &str) -> Result<(String, String), String> {
    let (key, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("usage: {}", usage))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn reference(rest: &str) -> Result<ElementRef, String> {
    rest.parse::<ElementRef>().map_err(|e| e.to_string())
}

/// `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let command = match word.to_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "reload" => Command::Reload,
        "draft" => Command::Draft,
        "name" => Command::Name(rest.to_string()),
        "set" => {
            let (key, value) = key_value(rest, "set <key>=<value>")?;
            Command::Set { key, value }
        }
        "save" => Command::Save,
        "clear" => Command::Clear,
        "view" | "open" => Command::View(reference(rest)?),
        "show" => Command::Show,
        "rename" => Command::Rename(rest.to_string()),
        "edit" => {
            let (key, value) = key_value(rest, "edit <key>=<value>")?;
            Command::Edit { key, value }
        }
        "unset" if !rest.is_empty() => Command::Unset(rest.to_string()),
        "unset" => return Err("usage: unset <key>".to_string()),
        "revert" => Command::Revert,
        "commit" => Command::Commit,
        "close" => Command::Close,
        "delete" | "rm" => Command::Delete(reference(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

fn list(manager: &ElementManager) -> Result<Reply, String> {
    render_list(manager.state(), OutputFormat::Pretty).map(Reply::Text)
}

fn working_copy(manager: &ElementManager) -> Result<Reply, String> {
    manager
        .session()
        .editing()
        .map(|e| Reply::Text(render_element(e)))
        .ok_or_else(|| "no element is open (use 'view <ref>')".to_string())
}

pub async fn execute(manager: &mut ElementManager, command: Command) -> Result<Reply, String> {
    match command {
        Command::List => list(manager),
        Command::Reload => {
            manager.load().await;
            list(manager)
        }
        Command::Draft => Ok(Reply::Text(render_element(manager.draft()))),
        Command::Name(name) => {
            manager.set_draft_name(name);
            Ok(Reply::Nothing)
        }
        Command::Set { key, value } => {
            manager.set_draft_field(key, parse_attribute_value(&value));
            Ok(Reply::Nothing)
        }
        Command::Save => {
            manager.save_draft().await;
            Ok(Reply::Nothing)
        }
        Command::Clear => {
            manager.reset_draft();
            Ok(Reply::Nothing)
        }
        Command::View(target) => {
            if !manager.view(&target) {
                return Err(format!("no element {} in the list", target));
            }
            working_copy(manager)
        }
        Command::Show => working_copy(manager),
        Command::Rename(name) => {
            manager
                .session_mut()
                .set_name(name)
                .map_err(|e| e.to_string())?;
            Ok(Reply::Nothing)
        }
        Command::Edit { key, value } => {
            manager
                .session_mut()
                .set_attribute(key, parse_attribute_value(&value))
                .map_err(|e| e.to_string())?;
            Ok(Reply::Nothing)
        }
        Command::Unset(key) => {
            manager
                .session_mut()
                .remove_attribute(&key)
                .map_err(|e| e.to_string())?;
            Ok(Reply::Nothing)
        }
        Command::Revert => {
            manager.session_mut().revert().map_err(|e| e.to_string())?;
            working_copy(manager)
        }
        Command::Commit => {
            manager.commit().await.map_err(|e| e.to_string())?;
            Ok(Reply::Nothing)
        }
        Command::Close => {
            manager.close();
            Ok(Reply::Nothing)
        }
        Command::Delete(target) => {
            manager.delete(&target).await;
            Ok(Reply::Nothing)
        }
        Command::Help => Ok(Reply::Text(HELP.to_string())),
        Command::Quit => Ok(Reply::Quit),
    }
}

fn prompt(manager: &ElementManager) -> String {
    match manager.session().selected().and_then(|e| e.reference()) {
        Some(target) => {
            let dirty = if manager.session().is_dirty() { "*" } else { "" };
            format!("elements[{}] {}{}> ", manager.elements().len(), target, dirty)
        }
        None => format!("elements[{}]> ", manager.elements().len()),
    }
}

/// Load the catalog, then read commands until `quit` or end of input.
pub async fn run(manager: &mut ElementManager) -> Result<()> {
    let mut editor = DefaultEditor::new().context("Failed to initialise line editor")?;

    manager.load().await;
    match list(manager) {
        Ok(Reply::Text(text)) => println!("{}", text),
        Ok(_) => {}
        Err(message) => eprintln!("{} {}", "error:".red().bold(), message),
    }
    println!("{}", "Type 'help' for commands.".dimmed());

    loop {
        let line_prompt = prompt(manager);
        let line = match tokio::task::block_in_place(|| editor.readline(&line_prompt)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("Failed to read command"),
        };
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{} {}", "error:".red().bold(), message);
                continue;
            }
        };

        match execute(manager, command).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Nothing) => {}
            Ok(Reply::Quit) => break,
            Err(message) => eprintln!("{} {}", "error:".red().bold(), message),
        }
    }
    Ok(())
}

/// Prints notices to the terminal and asks y/N before deletes.
pub struct ConsoleNotifier {
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => println!("{} {}", "OK".green().bold(), message),
            NoticeKind::Warning => eprintln!("{} {}", "WARNING:".yellow().bold(), message),
            NoticeKind::Error => eprintln!("{} {}", "ERROR:".red().bold(), message),
        }
    }

    async fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let prompt = format!("{} {} [y/N] ", "?".yellow().bold(), prompt);
        let answer = tokio::task::block_in_place(|| {
            let mut editor = DefaultEditor::new().ok()?;
            editor.readline(&prompt).ok()
        });
        matches!(
            answer.as_deref().map(|a| a.trim().to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use element_manager_core::{
        Element, MemoryStore, RecordingNotifier, StoreOp, ValidationProfile,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn seeded() -> Vec<Element> {
        serde_json::from_value(json!([
            {"id": "1", "name": "Google Pixel 6 Pro", "data": {"price": 499}},
            {"id": "2", "name": "Apple AirPods", "data": {"price": 120}}
        ]))
        .unwrap()
    }

    async fn manager() -> (ElementManager, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new(seeded()));
        let notifier = Arc::new(RecordingNotifier::new(true));
        let mut manager =
            ElementManager::new(store.clone(), notifier.clone(), ValidationProfile::PriceOnly);
        manager.load().await;
        (manager, store, notifier)
    }

    async fn run_line(manager: &mut ElementManager, line: &str) -> Result<Reply, String> {
        let command = parse_command(line)?.expect("non-blank line");
        execute(manager, command).await
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("LIST"), Ok(Some(Command::List)));
        assert_eq!(
            parse_command("set price = 12.5"),
            Ok(Some(Command::Set {
                key: "price".into(),
                value: "12.5".into()
            }))
        );
        assert_eq!(
            parse_command("view #3"),
            Ok(Some(Command::View(ElementRef::Local(3))))
        );
        assert_eq!(
            parse_command("delete ff8081"),
            Ok(Some(Command::Delete(ElementRef::Remote("ff8081".into()))))
        );
        assert_eq!(
            parse_command("name Apple iPad Air"),
            Ok(Some(Command::Name("Apple iPad Air".into())))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("set price").is_err());
        assert!(parse_command("edit =3").is_err());
        assert!(parse_command("view").is_err());
        assert!(parse_command("delete #abc").is_err());
        assert!(parse_command("unset").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[tokio::test]
    async fn test_form_to_created_element() {
        let (mut manager, store, _notifier) = manager().await;
        run_line(&mut manager, "name Apple iPad Air").await.unwrap();
        run_line(&mut manager, "set price=519.99").await.unwrap();
        run_line(&mut manager, "set color=Space Gray").await.unwrap();
        run_line(&mut manager, "save").await.unwrap();

        assert_eq!(store.count(StoreOp::Create).await, 1);
        let created = manager.elements().last().unwrap();
        assert_eq!(created.local_id, Some(3));
        assert_eq!(created.data.get("price"), &json!(519.99));
        assert_eq!(created.data.get("color"), &json!("Space Gray"));

        let Reply::Text(text) = run_line(&mut manager, "list").await.unwrap() else {
            panic!("list should print");
        };
        assert!(text.contains("Apple iPad Air"));
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected() {
        let (mut manager, store, notifier) = manager().await;
        run_line(&mut manager, "name Broken").await.unwrap();
        run_line(&mut manager, "set price=-5").await.unwrap();
        run_line(&mut manager, "save").await.unwrap();

        assert_eq!(store.count(StoreOp::Create).await, 0);
        assert_eq!(notifier.kinds().await, vec![NoticeKind::Warning]);
        assert_eq!(manager.draft().name, "Broken");
    }

    #[tokio::test]
    async fn test_edit_and_commit_remote() {
        let (mut manager, store, _notifier) = manager().await;
        let reply = run_line(&mut manager, "view 1").await.unwrap();
        assert!(matches!(reply, Reply::Text(ref t) if t.contains("Google Pixel 6 Pro")));
        assert_eq!(prompt(&manager), "elements[2] 1> ");

        run_line(&mut manager, "edit price=450").await.unwrap();
        assert_eq!(prompt(&manager), "elements[2] 1*> ");
        run_line(&mut manager, "commit").await.unwrap();

        assert_eq!(store.count(StoreOp::Update).await, 1);
        assert_eq!(manager.elements()[0].data.get("price"), &json!(450));
        assert_eq!(prompt(&manager), "elements[2]> ");
    }

    #[tokio::test]
    async fn test_close_discards_edits() {
        let (mut manager, store, _notifier) = manager().await;
        run_line(&mut manager, "view 2").await.unwrap();
        run_line(&mut manager, "rename Something Else").await.unwrap();
        run_line(&mut manager, "close").await.unwrap();

        assert_eq!(manager.elements()[1].name, "Apple AirPods");
        assert_eq!(store.count(StoreOp::Update).await, 0);
    }

    #[tokio::test]
    async fn test_session_commands_need_open_element() {
        let (mut manager, _store, _notifier) = manager().await;
        assert!(run_line(&mut manager, "show").await.is_err());
        assert!(run_line(&mut manager, "edit color=red").await.is_err());
        assert!(run_line(&mut manager, "commit").await.is_err());
        assert!(run_line(&mut manager, "view 99").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_quit() {
        let (mut manager, store, _notifier) = manager().await;
        run_line(&mut manager, "delete 2").await.unwrap();
        assert_eq!(manager.elements().len(), 1);
        assert_eq!(store.count(StoreOp::Delete).await, 1);
        assert_eq!(run_line(&mut manager, "quit").await, Ok(Reply::Quit));
    }

    #[tokio::test]
    async fn test_console_notifier_assume_yes() {
        assert!(ConsoleNotifier::new(true).confirm("Delete?").await);
    }
}
