use nu_ansi_term::Color;

fn main() {
    if let Err(err) = jaxscope_cli::run() {
        eprintln!("{} {}", Color::Red.bold().paint("error:"), err);
        std::process::exit(1);
    }
}
