fn main() {
    std::process::exit(myqtt_cli::run());
}
