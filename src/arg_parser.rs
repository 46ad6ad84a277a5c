use std::path::PathBuf;

use argparse::{ArgumentParser, Print, Store, StoreOption};

pub struct ArgsOptions {
    pub config_file_path: PathBuf,

    // Log to stdout when not set
    pub log_file_path: Option<PathBuf>,
}

impl ArgsOptions {
    pub fn parse() -> Self {
        let mut options = ArgsOptions::default();

        {
            let mut parser = ArgumentParser::new();
            parser.set_description(
                "Drive the GPU fan speeds according to a temperature curve",
            );

            // Configuration file path
            parser.refer(&mut options.config_file_path).add_option(
                &["-c", "--config"],
                Store,
                "The file path of the configuration file",
            );

            // Log file path
            parser.refer(&mut options.log_file_path).add_option(
                &["-l", "--log-file"],
                StoreOption,
                "Append the logs to the given file instead of stdout",
            );

            // Show daemon version
            parser.add_option(
                &["-V", "--version"],
                Print(env!("CARGO_PKG_VERSION").to_string()),
                "Show the daemon version",
            );

            parser.parse_args_or_exit();
        }

        options
    }
}

impl Default for ArgsOptions {
    fn default() -> Self {
        Self {
            config_file_path: PathBuf::from("config.json"),
            log_file_path: None,
        }
    }
}
