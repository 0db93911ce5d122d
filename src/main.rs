fn main() {
    if let Err(err) = graderboard::app::run_cli() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
