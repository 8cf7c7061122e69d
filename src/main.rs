use dvol::ui::output;

fn main() {
    if let Err(e) = dvol::cli::run() {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
