fn main() {
    if let Err(e) = simtrust::cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
