use std::path::Path;
use std::rc::Rc;

use clap::Parser;
use eyre::{Result, eyre};

use lectern::{
    cli::Cli,
    config::Config,
    logging,
    reading::{ReadingController, ReadingSession},
    share::remove_special_codes,
    split::ActiveSplit,
    state::MarkerStore,
    ui::reader::Reader,
    version::{JsonVersion, VersionSource},
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(logging::level_from_verbosity(cli.verbose));

    let config = match cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::new()?,
    };

    if cli.history {
        return print_history(&config);
    }

    let version_path = cli
        .version_file
        .as_deref()
        .ok_or_else(|| eyre!("no version file given; see --help"))?;

    let version = JsonVersion::open(version_path)?;
    let version_id = version.version_id().to_string();
    let session = ReadingSession::new(version_id.clone(), Rc::new(version));

    let store = Rc::new(MarkerStore::new()?);
    let mut controller =
        ReadingController::new(session, store.clone(), config.settings.max_pericope_blocks)?;

    // Restore the last location; clamping makes a stale ari harmless.
    if let Some((last_ari, _)) = store.load_last_state()? {
        controller.jump_to_ari(last_ari);
    }

    if let Some(reference) = &cli.go {
        let ari = controller.jump_to(reference)?;
        if !ari.is_zero() {
            store.add_history(ari)?;
        }
    }

    if let Some(split_path) = &cli.split {
        attach_split_from_file(&mut controller, split_path);
    }

    if cli.dump {
        return dump_chapter(&controller);
    }

    let mut reader = Reader::new(controller, store, config);
    reader.run()
}

fn attach_split_from_file(controller: &mut ReadingController, path: &Path) {
    let opened = JsonVersion::open(path).map(|version| ActiveSplit {
        version_id: version.version_id().to_string(),
        version: Rc::new(version),
    });
    if !controller.attach_split(opened) {
        eprintln!("Warning: could not open split version {}", path.display());
    }
}

fn print_history(config: &Config) -> Result<()> {
    let store = MarkerStore::new()?;
    let entries = store.recent_history(config.settings.history_limit)?;
    if entries.is_empty() {
        println!("No reading history.");
        return Ok(());
    }
    for entry in entries {
        println!("{}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.ari);
    }
    Ok(())
}

fn dump_chapter(controller: &ReadingController) -> Result<()> {
    println!("{}", controller.reference());
    let snapshot = controller.primary().snapshot();
    for (verse_0, text) in snapshot.chapter.verses.iter().enumerate() {
        println!("{} {}", verse_0 + 1, remove_special_codes(text));
    }
    Ok(())
}
