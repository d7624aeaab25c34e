//! Pipeline tests over real directories
//!
//! Source trees are written to temporary directories and compiled with
//! `Codebase::load` + `transpile`, the same path the CLI takes.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use crate::config::CompilerConfig;
    use crate::error::PipelineError;
    use crate::pipeline::{Codebase, STAMP_FILE};

    fn write(root: &Path, path: &str, code: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, code).unwrap();
    }

    fn config(root: &Path) -> CompilerConfig {
        write(
            root,
            "framework/ext.js",
            "Ext.define('Ext.Widget', { config: { cls: null } });\n\
             Ext.define('Ext.Panel', { extend: 'Ext.Widget', alias: 'widget.panel' });",
        );
        CompilerConfig {
            source_dir: root.join("src"),
            target_dir: root.join("out"),
            framework_file: Some(root.join("framework/ext.js")),
            snapshot_dir: root.join("snapshots"),
            ..Default::default()
        }
    }

    fn sample_tree(src: &Path) {
        write(
            src,
            "app/view/Main.js",
            "Ext.define('App.view.Main', {\n\
                 extend: 'Ext.Panel',\n\
                 controller: 'main',\n\
                 title: 'Home'\n\
             });",
        );
        write(
            src,
            "app/view/MainController.js",
            "Ext.define('App.view.MainController', {\n\
                 alias: 'controller.main',\n\
                 onSave: function() {}\n\
             });",
        );
        write(src, "app/model/User.js", "Ext.define('App.model.User', { config: { name: '' } });");
        write(src, "app/boot.js", "console.log('boot');");
        write(src, "resources/app.css", ".main { color: red; }");
    }

    #[test]
    fn test_transpile_writes_compiled_copied_and_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        sample_tree(&config.source_dir);

        let codebase = Codebase::load(&config).unwrap();
        let (summary, diagnostics) = codebase.transpile(&config.target_dir).unwrap();
        assert_eq!(summary.compiled, 2);
        assert_eq!(summary.copied, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.fallbacks, 0);
        assert!(diagnostics.entries.iter().all(|d| !d.code.ends_with("FALLBACK")));

        let out = &config.target_dir;
        let stamp = fs::read_to_string(out.join(STAMP_FILE)).unwrap();
        assert!(stamp.contains("extjs2react"));

        assert_eq!(
            fs::read_to_string(out.join("app/boot.js")).unwrap(),
            "console.log('boot');"
        );
        assert_eq!(
            fs::read_to_string(out.join("resources/app.css")).unwrap(),
            ".main { color: red; }"
        );
        assert!(!out.join("app/view/MainController.js").exists());

        let main = fs::read_to_string(out.join("app/view/Main.js")).unwrap();
        assert!(main.contains("function MainView(props){"), "{}", main);
        assert!(main.contains("const onSave = "), "{}", main);
        let user = fs::read_to_string(out.join("app/model/User.js")).unwrap();
        assert!(user.contains("class UserModel{"), "{}", user);
    }

    #[test]
    fn test_second_run_removes_newly_assimilated_unit() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        sample_tree(&config.source_dir);
        let stale = config.target_dir.join("app/view/MainController.js");

        Codebase::load(&config).unwrap().transpile(&config.target_dir).unwrap();
        write(&config.target_dir, "app/view/MainController.js", "stale");
        Codebase::load(&config).unwrap().transpile(&config.target_dir).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_unstamped_target_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        sample_tree(&config.source_dir);
        write(&config.target_dir, "keep.txt", "mine");

        let codebase = Codebase::load(&config).unwrap();
        let err = codebase.transpile(&config.target_dir).unwrap_err();
        assert!(matches!(err, PipelineError::StampMismatch { .. }));

        let entries: Vec<_> = fs::read_dir(&config.target_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(config.target_dir.join("keep.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_snapshot_restores_resolved_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.snapshot_id = Some("main".to_string());
        sample_tree(&config.source_dir);

        let first = Codebase::load(&config).unwrap();
        assert!(config.snapshot_dir.join("main.json").exists());
        let restored = Codebase::load(&config).unwrap();

        assert_eq!(first.registry().len(), restored.registry().len());
        assert_eq!(
            restored.registry().resolve_alias("controller.main"),
            Some("App.view.MainController")
        );
        assert!(restored.registry().resolution("App.view.Main").unwrap().is_component);
        assert_eq!(first.unparseable(), restored.unparseable());

        let (a, _) = first.compile();
        let (b, _) = restored.compile();
        assert_eq!(a, b);
    }

    #[test]
    fn test_changed_source_invalidates_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.snapshot_id = Some("main".to_string());
        sample_tree(&config.source_dir);

        Codebase::load(&config).unwrap();
        write(
            &config.source_dir,
            "app/model/Order.js",
            "Ext.define('App.model.Order', {});",
        );
        let codebase = Codebase::load(&config).unwrap();
        assert!(codebase.registry().resolve_class("App.model.Order").is_some());
    }

    #[test]
    fn test_compile_failure_falls_back_to_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        // a leftover statement that is only legal in a script
        let source = "with (scope) { go(); }\nExt.define('App.Legacy', {});";
        write(&config.source_dir, "app/Legacy.js", source);

        let codebase = Codebase::load(&config).unwrap();
        let (summary, diagnostics) = codebase.transpile(&config.target_dir).unwrap();
        assert_eq!(summary.fallbacks, 1);
        assert_eq!(diagnostics.count_code(crate::diagnostics::DIAG_UNIT_FALLBACK), 1);
        assert_eq!(
            fs::read_to_string(config.target_dir.join("app/Legacy.js")).unwrap(),
            source
        );
    }
}
