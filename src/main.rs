fn main() {
    std::process::exit(reposcan::app::startup::startup());
}
