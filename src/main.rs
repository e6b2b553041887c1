fn main() {
    if let Err(err) = rowstream::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
