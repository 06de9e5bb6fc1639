mod cli;
mod error;
mod model;
mod platform;
mod report;

use clap::Parser;

use cli::CliArgs;
use model::RenderMode;
use platform::{create_provider, ProviderConfig};

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let provider = create_provider(ProviderConfig {
        locks_only: args.locks_only,
    });

    let lockers = match provider.find_lockers(&args.files) {
        Ok(lockers) => lockers,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.terse {
        for locker in &lockers {
            println!("{}", locker.pid);
        }
    } else if args.format.is_some() {
        let mode = RenderMode::from_spec(args.format.as_deref());
        for locker in &lockers {
            match mode {
                // The verbose dump already ends with a newline per line.
                RenderMode::Verbose => print!("{}", locker.render(mode)),
                _ => println!("{}", locker.render(mode)),
            }
        }
    } else {
        let file_names: Vec<String> = args
            .files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        let mut buf = String::new();
        report::write_report(&mut buf, &lockers, &file_names, args.max);
        // No holders means no output at all.
        if !buf.is_empty() {
            print!("{}", buf);
        }
    }
}

/// Initialize tracing on stderr. RUST_LOG (if set) takes precedence;
/// otherwise -v/-vv map to "debug"/"trace".
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let base = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| base.to_string());
    let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
