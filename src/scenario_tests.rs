//! End-to-end scenarios over in-memory codebases
//!
//! Each test builds a framework unit plus project units, runs the full
//! parse → register → finalize → compile sequence and checks the emitted code.

#[cfg(test)]
mod tests {
    use crate::capability::{Capability, CapabilityTable, PropTransform};
    use crate::config::CompilerConfig;
    use crate::diagnostics::{DIAG_DUPLICATE_ALIAS, DIAG_UNKNOWN_ALIAS};
    use crate::discovery::SourceFile;
    use crate::pipeline::{Codebase, UnitOutput};

    const FRAMEWORK: &str = "\
        Ext.define('Ext.Widget', { config: { cls: null, hidden: false } });\n\
        Ext.define('Ext.Panel', { extend: 'Ext.Widget', alias: 'widget.panel', config: { title: null } });\n\
        Ext.define('Ext.Button', { extend: 'Ext.Widget', alias: 'widget.button' });\n\
        Ext.define('Ext.app.Application', {});";

    fn source(path: &str, code: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            source: code.to_string(),
        }
    }

    fn codebase(files: &[(&str, &str)]) -> Codebase {
        let scripts = files.iter().map(|(p, c)| source(p, c)).collect();
        let framework = source("ext.js", FRAMEWORK);
        Codebase::from_sources(scripts, Some(&framework), &CompilerConfig::default()).unwrap()
    }

    fn output<'o>(outputs: &'o [UnitOutput], path: &str) -> &'o str {
        outputs
            .iter()
            .find(|o| o.path() == path)
            .and_then(|o| o.code())
            .unwrap_or_else(|| panic!("no output for {}", path))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCENARIOS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_plain_config_without_hooks_is_a_field() {
        let codebase = codebase(&[
            ("app/Bar.js", "Ext.define('App.Bar', {});"),
            (
                "app/Foo.js",
                "Ext.define('App.Foo', { extend: 'App.Bar', config: { title: 'x' } });",
            ),
        ]);
        let (outputs, _) = codebase.compile();
        let code = output(&outputs, "app/Foo.js");
        assert!(code.contains("import Bar from './Bar'"), "{}", code);
        assert!(code.contains("class Foo extends Bar{\n  title = 'x'\n}"), "{}", code);
        assert!(!code.contains("get title"));
        assert!(code.trim_end().ends_with("export default Foo"));
    }

    #[test]
    fn test_button_config_through_capability_table() {
        let mut table = CapabilityTable::empty();
        table.insert(Capability::new("component").output("div"));
        table.insert(
            Capability::new("button")
                .extends("component")
                .output("Button")
                .prop("text", PropTransform::Suppress)
                .prop("onTap", PropTransform::Rename("onClick")),
        );

        let codebase = codebase(&[(
            "app/Bar.js",
            "Ext.define('App.Bar', {\n\
                 extend: 'Ext.Panel',\n\
                 items: [{ xtype: 'button', text: 'Go', handler: 'onGo' }],\n\
                 onGo: function() {}\n\
             });",
        )])
        .with_capabilities(table);

        let (outputs, _) = codebase.compile();
        let code = output(&outputs, "app/Bar.js");
        assert!(code.contains("<Button onClick={onGo} />"), "{}", code);
        assert!(!code.contains("text="));
        assert!(!code.contains("handler="));
        assert!(code.contains("import { Button"), "{}", code);
    }

    #[test]
    fn test_template_conditional_in_item_config() {
        let codebase = codebase(&[(
            "app/Status.js",
            "Ext.define('App.Status', {\n\
                 extend: 'Ext.Panel',\n\
                 items: [{ xtype: 'list', itemTpl: '<tpl if=\"active\">On</tpl><tpl else>Off</tpl>' }]\n\
             });",
        )]);
        let (outputs, _) = codebase.compile();
        let code = output(&outputs, "app/Status.js");
        assert!(code.contains("const itemTpl = new Template(data => ("), "{}", code);
        assert!(code.contains("data.active ? <>On</> : <>Off</>"), "{}", code);
        assert!(code.contains("itemTpl={itemTpl}"), "{}", code);
    }

    #[test]
    fn test_duplicate_alias_across_units_keeps_first() {
        let codebase = codebase(&[
            ("app/A.js", "Ext.define('App.A', { alias: 'widget.foo' });"),
            ("app/B.js", "Ext.define('App.B', { alias: 'widget.foo' });"),
        ]);
        assert!(codebase.diagnostics().has_code(DIAG_DUPLICATE_ALIAS));
        assert_eq!(codebase.registry().resolve_alias("widget.foo"), Some("App.A"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_redeclared_parent_config_is_absorbed() {
        let codebase = codebase(&[
            ("app/Base.js", "Ext.define('App.Base', { config: { size: 1 } });"),
            (
                "app/Child.js",
                "Ext.define('App.Child', { extend: 'App.Base', config: { size: 2, color: 'red' } });",
            ),
        ]);
        let child = codebase.registry().resolution("App.Child").unwrap();
        assert_eq!(child.inherited_configs, vec!["size"]);
        assert!(child.local_configs.iter().all(|c| c.name != "size"));

        let (outputs, _) = codebase.compile();
        let code = output(&outputs, "app/Child.js");
        assert_eq!(code.matches("color = 'red'").count(), 1, "{}", code);
        assert!(!code.contains("get size"));
    }

    #[test]
    fn test_local_alias_shadows_framework_alias() {
        let codebase = codebase(&[(
            "app/Panel.js",
            "Ext.define('App.Panel', { extend: 'Ext.Panel', alias: 'widget.panel' });",
        )]);
        assert_eq!(codebase.registry().resolve_alias("widget.panel"), Some("App.Panel"));
        assert_eq!(codebase.registry().resolve_alias("widget.button"), Some("Ext.Button"));
    }

    #[test]
    fn test_unknown_widget_is_reported_and_tallied() {
        let codebase = codebase(&[(
            "app/Main.js",
            "Ext.define('App.Main', { extend: 'Ext.Panel', items: [{ xtype: 'gauge', value: 3 }] });",
        )]);
        let (outputs, diagnostics) = codebase.compile();
        assert!(diagnostics.has_code(DIAG_UNKNOWN_ALIAS));
        assert_eq!(diagnostics.unrecognized_tags.get("gauge"), Some(&1));
        assert!(matches!(
            outputs.iter().find(|o| o.path() == "app/Main.js"),
            Some(UnitOutput::Compiled { .. })
        ));

        let report = codebase.usage_report(&diagnostics);
        assert_eq!(report.unrecognized_tags, vec![("gauge".to_string(), 1)]);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let files = [
            ("app/Model.js", "Ext.define('App.Model', { config: { id: null } });"),
            (
                "app/Store.js",
                "Ext.define('App.Store', {\n\
                     extend: 'App.Model',\n\
                     load: function(a, b) {\n\
                         var me = this;\n\
                         return Ext.Array.contains(a, b) ? 'a' + me.getId() : Ext.emptyFn;\n\
                     }\n\
                 });",
            ),
        ];
        let (first, _) = codebase(&files).compile();
        let (second, _) = codebase(&files).compile();
        assert_eq!(first, second);

        let code = output(&first, "app/Store.js");
        assert!(code.contains("a.includes(b)"), "{}", code);
        assert!(code.contains("this.id"), "{}", code);
        assert!(!code.contains("var me"));
        assert!(!code.contains("getId"));
    }

    #[test]
    fn test_application_subclass_is_a_singleton_instance() {
        let codebase = codebase(&[(
            "app/Application.js",
            "Ext.define('App.Application', { extend: 'Ext.app.Application', name: 'App' });",
        )]);
        let (outputs, _) = codebase.compile();
        let code = output(&outputs, "app/Application.js");
        assert!(code.contains("export default new Application()"), "{}", code);
    }

    #[test]
    fn test_units_without_define_are_not_compiled() {
        let codebase = codebase(&[
            ("app/util.js", "export const x = 1;"),
            ("app/A.js", "Ext.define('App.A', {});"),
        ]);
        assert_eq!(codebase.unparseable(), &["app/util.js".to_string()]);
        let (outputs, _) = codebase.compile();
        assert_eq!(outputs.len(), 1);
    }
}
