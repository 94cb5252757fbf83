use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("login", include_str!("../../templates/login.html"))
        .expect("embedded login template must parse");
    env.add_template("dashboard", include_str!("../../templates/dashboard.html"))
        .expect("embedded dashboard template must parse");
    env
});

#[derive(Serialize)]
pub struct LoginContext<'a> {
    pub error: Option<&'a str>,
}

/// Dashboard view data. Carries the editable settings fields only — the
/// password hash never reaches the template layer.
#[derive(Serialize)]
pub struct DashboardContext {
    pub app_text: String,
    pub v2ray_configs: String,
    pub deprecated_version: String,
    pub force_update: bool,
    pub device_count: usize,
    pub flash: Option<String>,
}

pub fn render_login(ctx: &LoginContext) -> Result<String, minijinja::Error> {
    TEMPLATES.get_template("login")?.render(ctx)
}

pub fn render_dashboard(ctx: &DashboardContext) -> Result<String, minijinja::Error> {
    TEMPLATES.get_template("dashboard")?.render(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_renders_with_and_without_error() {
        let plain = render_login(&LoginContext { error: None }).unwrap();
        assert!(plain.contains("name=\"password\""));
        assert!(!plain.contains("Wrong password"));

        let with_error = render_login(&LoginContext {
            error: Some("Wrong password"),
        })
        .unwrap();
        assert!(with_error.contains("Wrong password"));
    }

    #[test]
    fn dashboard_renders_settings_and_flash() {
        let page = render_dashboard(&DashboardContext {
            app_text: "welcome".into(),
            v2ray_configs: "vless://example".into(),
            deprecated_version: "1.2.3".into(),
            force_update: true,
            device_count: 7,
            flash: Some("Settings saved".into()),
        })
        .unwrap();

        assert!(page.contains("welcome"));
        assert!(page.contains("1.2.3"));
        assert!(page.contains("Settings saved"));
        assert!(page.contains("7"));
        assert!(page.contains("checked"));
    }
}
