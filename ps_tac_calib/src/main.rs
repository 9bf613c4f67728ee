pub fn main() -> std::process::ExitCode {
    ps_tac_calib::init::run()
}
