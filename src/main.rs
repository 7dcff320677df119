fn main() -> std::process::ExitCode {
    asset_meta_admin_lib::run()
}
