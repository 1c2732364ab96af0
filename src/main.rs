use std::{path::PathBuf, process, sync::Arc};

use mapty::{
    database::store::FileStore,
    enrichment::{api::HttpLookup, TokioEnricher},
    presentation::headless::{parse_event, HeadlessPresentation},
    util::{facilities::DependenciesBuilder, logging, settings::Settings},
    App,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Handle,
    sync::mpsc,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(Settings::DEFAULT_FILE));

    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}: {}", config_path.display(), err);
            process::exit(1);
        }
    };

    if let Err(err) = logging::setup_logging(&settings.logging) {
        eprintln!("Logging unavailable: {}", err);
    }

    let builder = DependenciesBuilder::new()
        .with_presentation(HeadlessPresentation::echoing())
        .with_store(FileStore::new(&settings.storage.directory));

    let (builder, mut outcomes) = if settings.enrichment.enabled {
        let lookup = Arc::new(HttpLookup::new(&settings.enrichment));
        let (enricher, outcomes) = TokioEnricher::new(Handle::current(), lookup);
        (builder.with_enricher(enricher), outcomes)
    } else {
        let (_, outcomes) = mpsc::unbounded_channel();
        (builder, outcomes)
    };

    let facilities = match builder.build() {
        Ok(facilities) => facilities,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let mut app = App::new(settings, facilities);
    let report = app.start();
    println!(
        "Restored {} workouts ({} skipped)",
        report.restored, report.skipped
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_event(&line) {
                    Ok(Some(event)) => app.handle(event),
                    Ok(None) => {}
                    Err(err) => eprintln!("{}", err),
                },
                Ok(None) => break,
                Err(err) => {
                    eprintln!("stdin: {}", err);
                    break;
                }
            },
            Some(outcome) = outcomes.recv() => {
                app.apply_enrichment(outcome);
            }
        }
    }
}
