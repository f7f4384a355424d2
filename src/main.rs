mod app;
mod cli;

fn main() {
    let cli = cli::parse();
    ffplan::engine::init_logging(cli.verbose);
    app::run(cli);
}
