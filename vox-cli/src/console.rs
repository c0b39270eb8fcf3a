use std::path::Path;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use vox_rag::VoiceRagPipeline;

use crate::commands::{display_name, format_report, format_result, format_voices};
use crate::session::{ConsoleCommand, ConsoleSession};

const HELP: &str = "\
Commands:
  :ingest <path> [name]  add a PDF, text or markdown file
  :docs                  list documents ingested in this session
  :voice <name>          change the narration voice
  :voices                list available voices
  :help                  show this help
  :quit                  leave the console
Anything else is asked as a question.";

pub async fn run_console(pipeline: &VoiceRagPipeline, mut session: ConsoleSession) -> Result<()> {
    pipeline.ensure_collection().await?;
    let mut rl = DefaultEditor::new()?;

    println!("Vox console");
    println!("Collection: {}", pipeline.config().collection_name);
    println!("Voice: {}", session.voice);
    println!("Type :help for commands. Ctrl+C to exit.\n");

    loop {
        let line = match rl.readline("vox> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        };

        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };
        rl.add_history_entry(line.as_str())?;

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Voices => println!("{}", format_voices(session.voice)),
            ConsoleCommand::Voice(name) => match session.set_voice(&name) {
                Ok(voice) => println!("Voice set to {voice}"),
                Err(e) => eprintln!("{e}"),
            },
            ConsoleCommand::Docs => {
                if session.processed_documents.is_empty() {
                    println!("No documents ingested yet.");
                }
                for doc in &session.processed_documents {
                    println!("  {doc}");
                }
            }
            ConsoleCommand::Ingest { path, name } => {
                let path = Path::new(&path);
                let name = display_name(path, name.as_deref());
                if session.is_processed(&name) {
                    println!("{name} was already ingested in this session, skipping.");
                    continue;
                }
                match pipeline.ingest_file(path, name.clone()).await {
                    Ok(report) => {
                        session.mark_processed(name);
                        println!("{}", format_report(&report));
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            ConsoleCommand::Ask(question) => {
                let result = pipeline.answer_query(&question, Some(session.voice.as_str())).await;
                println!("\n{}\n", format_result(&result));
            }
            ConsoleCommand::Unknown(input) => {
                eprintln!("Unknown command '{input}'. Type :help for commands.");
            }
        }
    }

    Ok(())
}
