fn main() {
    if let Err(err) = ev_charging_dashboard::app::run_admin() {
        eprintln!("admin command failed: {err}");
        std::process::exit(1);
    }
}
