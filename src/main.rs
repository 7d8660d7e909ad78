use std::{env, io, process, sync::Arc};

use clap::Parser;
use log::{error, info};

use stak::{
    initialize_logger, ui, App, Cli, Config, DayFileStore, EntryService, LinkExtractor,
};

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    if let Some(dir) = &cli.dir {
        config.set_data_dir(dir);
    }

    if cli.create_config || cli.show_config {
        let app = App::new(config, cli.config.clone());
        let result = if cli.create_config {
            env::current_dir()
                .map_err(Into::into)
                .and_then(|cwd| app.create_config(&cwd, &mut io::stdout()).map(|_| ()))
        } else {
            app.show_config(&mut io::stdout())
        };
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = config.ensure_data_dir() {
        eprintln!("Error initializing storage: {}", e);
        process::exit(1);
    }
    initialize_logger(&config, cli.verbose);
    info!("stak {} starting up", env!("CARGO_PKG_VERSION"));

    let store = match DayFileStore::new(&config).and_then(|store| {
        store.initialize()?;
        Ok(store)
    }) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Storage initialization failed: {}", e);
            eprintln!("Error initializing storage: {}", e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            process::exit(1);
        }
    };

    let fetcher = match LinkExtractor::new() {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            eprintln!("Error creating link extractor: {}", e);
            process::exit(1);
        }
    };

    let service = EntryService::new(store, fetcher, Some(runtime.handle().clone()))
        .with_fuzzy_search(config.fuzzy_search);
    let theme = ui::Theme::from_name(&config.theme);

    if let Err(e) = ui::run(Arc::new(service), runtime.handle().clone(), theme) {
        error!("Application error: {}", e);
        eprintln!("Error running stak: {}", e);
        process::exit(1);
    }

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    info!("Application shutting down");
}
