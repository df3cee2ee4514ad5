fn main() {
    if let Err(err) = sheet_editor::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
