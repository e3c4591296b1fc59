fn main() {
    greenbench_cli::init_logging();
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    let code = greenbench_cli::run(std::env::args(), &mut out, &mut err);
    std::process::exit(code);
}
