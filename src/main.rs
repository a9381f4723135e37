fn main() {
    if let Err(err) = bcm_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
