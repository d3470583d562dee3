use clap::Parser;
use cybersonic::cli::ClientArgs;
use cybersonic::client::SfxClient;
use cybersonic::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = ClientArgs::parse();
    logging::init_client();

    let result = SfxClient::new(&args.address, args.verbose).and_then(|client| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        client.run(&args.command(), &mut out)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
