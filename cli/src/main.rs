use oi_bridge_cli::core::BridgeApp;

fn main() {
    if let Err(e) = BridgeApp::run() {
        eprintln!("\nError: {:#}\n", e);
        std::process::exit(1);
    }
}
