use clap::Parser;

mod apply;
mod changeset;
mod cli;
mod completion;
mod docs;
mod error;
mod exec;
mod logging;
mod prompt;
mod run;
mod util;

fn main() {
    logging::init();
    let args = cli::RootArgs::parse();

    let credentials = completion::Credentials::from_env();
    let config = run::RunConfig {
        workdir: args.workdir,
        issue_path: args.issue,
        protocol_path: args.protocol,
        model: args.model,
        mode: if args.lenient {
            prompt::ParseMode::Lenient
        } else {
            prompt::ParseMode::Strict
        },
    };

    // Sole conversion point from pipeline failures to process exit status.
    if let Err(err) = run::run(&config, &credentials) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}
