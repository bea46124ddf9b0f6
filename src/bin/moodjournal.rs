use anyhow::Result;
use moodjournal::cli::{self, Command};
use moodjournal::config::Config;
use moodjournal::context::{AppContext, SharedContext, StandardContext};
use moodjournal::model::{Event, EventPage, PrimaryType};
use moodjournal::store::EventStore;
use std::env;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use strum::IntoEnumIterator;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let binary_name = args.first().map(String::as_str).unwrap_or("moodjournal");
    let cli = cli::parse_args(args.get(1..).unwrap_or_default())?;

    if cli.command == Command::Help {
        cli::print_help(binary_name);
        return Ok(());
    }

    let ctx: SharedContext = Arc::new(StandardContext::new(cli.root.clone()));
    let mut config = Config::load(ctx.as_ref())?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(session) = cli.session_id {
        config.session_id = Some(session);
    }

    moodjournal::logging::init(ctx.as_ref(), config.log_level_filter());

    match cli.command {
        Command::InitConfig => {
            let path = ctx.get_config_file_path()?;
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                config.save(ctx.as_ref())?;
                println!("Wrote {}", Config::get_path_string(ctx.as_ref())?);
            }
        }
        Command::Types => {
            for t in PrimaryType::iter() {
                println!("{:<14} {:<14} {}", t.as_str(), t.label(), t.default_color());
            }
        }
        command => {
            let store = EventStore::open(ctx.clone(), &config)?;
            execute(&store, &config, command).await?;
        }
    }
    Ok(())
}

async fn execute(store: &EventStore, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::List {
            filter,
            page,
            page_size,
        } => {
            let page_size = page_size.unwrap_or(config.page_size);
            let result = store.list(&filter, page, page_size).await?;
            print_page(&result, page, page_size);
        }
        Command::Show(id) => match store.get(&id).await? {
            Some(event) => print_event(&event),
            None => println!("No event with id {}", id),
        },
        Command::SetStatus(id, status) => {
            store.update_status(&id, status).await?;
            println!("Event {} marked {}", id, status);
        }
        Command::Edit(id, patch) => {
            store.update(&id, patch).await?;
            println!("Event {} updated", id);
        }
        Command::Delete(id) => {
            store.delete(&id).await?;
            println!("Event {} deleted", id);
        }
        Command::Extract(text) => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf.trim_end().to_string()
                }
            };
            let event = store.extract_from_dialog(&text)?;
            println!("Created event {}", event.id);
            print_event(&event);
        }
        Command::Types | Command::InitConfig | Command::Help => {}
    }
    Ok(())
}

fn print_page(page: &EventPage, number: usize, page_size: usize) {
    if page.items.is_empty() {
        println!("No events (total matching: {})", page.total);
        return;
    }
    for e in &page.items {
        println!(
            "{:<38} {:<10} {:<14} {:<17} {}",
            e.id,
            e.status,
            e.type_label(),
            e.time,
            e.title
        );
    }
    let pages = page.total.div_ceil(page_size.max(1));
    println!();
    println!("Page {}/{} ({} matching)", number, pages, page.total);
}

fn print_event(e: &Event) {
    println!("id:          {}", e.id);
    println!("type:        {} {}", e.type_label(), e.sub_type);
    println!("status:      {}", e.status);
    println!("title:       {}", e.title);
    println!("time:        {}", e.time);
    println!("content:     {}", e.content);
    println!("dialog:      {}", e.dialog_content);
    println!("source:      {}", e.source_dialog_id);
    println!("created:     {}", e.create_time);
    println!("updated:     {}", e.update_time);
    println!("color:       {}", e.tag_color);
}
