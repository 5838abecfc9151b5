fn main() {
    if let Err(err) = lexicard_lib::run() {
        eprintln!("lexicard: {err:#}");
        std::process::exit(1);
    }
}
