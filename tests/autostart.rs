#[cfg(test)]
mod tests {
    use autocontinue::libs::autostart;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct AutostartTestContext {
        _temp_dir: TempDir,
        _env: MutexGuard<'static, ()>,
    }

    impl TestContext for AutostartTestContext {
        fn setup() -> Self {
            let env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join("config"));

            AutostartTestContext {
                _temp_dir: temp_dir,
                _env: env,
            }
        }
    }

    #[test]
    fn launch_command_starts_in_the_background() {
        let command = autostart::launch_command().unwrap();
        assert!(command.starts_with('"'));
        assert!(command.ends_with("\" --background"));
    }

    #[cfg(target_os = "linux")]
    #[test_context(AutostartTestContext)]
    #[test]
    fn entry_lives_under_xdg_config_home(_ctx: &mut AutostartTestContext) {
        let path = autostart::desktop_entry_path().unwrap();
        let expected = std::env::var("XDG_CONFIG_HOME").unwrap();
        assert!(path.starts_with(expected));
        assert!(path.ends_with("autostart/autocontinue.desktop"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn desktop_entry_runs_the_command() {
        let entry = autostart::desktop_entry("\"/opt/autocontinue\" --background");
        assert!(entry.starts_with("[Desktop Entry]\n"));
        assert!(entry.contains("Exec=\"/opt/autocontinue\" --background\n"));
        assert!(entry.contains("Type=Application\n"));
    }

    #[cfg(target_os = "linux")]
    #[test_context(AutostartTestContext)]
    #[test]
    fn enable_toggle_and_disable(_ctx: &mut AutostartTestContext) {
        assert!(!autostart::is_enabled().unwrap());
        assert_eq!(autostart::status().unwrap(), "disabled");

        autostart::enable().unwrap();
        assert!(autostart::is_enabled().unwrap());
        assert!(autostart::desktop_entry_path().unwrap().exists());
        assert_eq!(autostart::status().unwrap(), "enabled");

        // Enabling again rewrites the same entry.
        autostart::enable().unwrap();
        assert!(autostart::is_enabled().unwrap());

        assert!(!autostart::toggle().unwrap());
        assert!(!autostart::is_enabled().unwrap());
        assert!(autostart::toggle().unwrap());
        assert!(autostart::is_enabled().unwrap());

        autostart::disable().unwrap();
        autostart::disable().unwrap();
        assert!(!autostart::is_enabled().unwrap());
    }

    #[test_context(AutostartTestContext)]
    #[test]
    fn status_is_enabled_or_disabled(_ctx: &mut AutostartTestContext) {
        let status = autostart::status().unwrap();
        assert!(status == "enabled" || status == "disabled");
    }
}
