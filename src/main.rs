use cs_model::LoaderConfig;

fn main() {
    env_logger::init();

    let file = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: classforge <path-to-.class>");
        std::process::exit(1);
    });

    let contents = std::fs::read(&file).unwrap_or_else(|err| {
        eprintln!("could not read {}: {}", file, err);
        std::process::exit(1);
    });

    let config = LoaderConfig::default();

    let class_file = match cs_parser::load_class_file(&contents, &config) {
        Ok(class_file) => class_file,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    cs_class_printer::print(&class_file);
}
