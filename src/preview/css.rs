//! CSS generation for the admin chrome
//!
//! The stylesheet is produced in independent sections so the preview engine
//! can cache each one against a hash of the settings it reads. Output is
//! byte-stable: the same snapshot always yields the same string.

use crate::constants::preview::DARK_MODE_CLASS;
use crate::settings::{SettingValue, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    AdminBar,
    AdminMenu,
    Typography,
    VisualEffects,
    DarkMode,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::AdminBar,
        Section::AdminMenu,
        Section::Typography,
        Section::VisualEffects,
        Section::DarkMode,
    ];

    /// Whether a change to `key` can affect this section's output.
    ///
    /// Glassmorphism and floating are rendered inside the admin bar block, so
    /// the bar section also depends on its visual-effects subtree.
    pub fn relevant(self, key: &str) -> bool {
        match self {
            Section::AdminBar => {
                key.starts_with("admin_bar.") || key.starts_with("visual_effects.admin_bar.")
            }
            Section::AdminMenu => key.starts_with("admin_menu."),
            Section::Typography => key.starts_with("typography."),
            Section::VisualEffects => key.starts_with("visual_effects."),
            Section::DarkMode => key.starts_with("dark_mode."),
        }
    }

    pub fn generate(self, settings: &Snapshot) -> String {
        match self {
            Section::AdminBar => admin_bar_css(settings),
            Section::AdminMenu => admin_menu_css(settings),
            Section::Typography => typography_css(settings),
            Section::VisualEffects => visual_effects_css(settings),
            Section::DarkMode => dark_mode_css(settings),
        }
    }
}

fn num(settings: &Snapshot, key: &str, fallback: f64) -> f64 {
    settings.get(key).and_then(SettingValue::as_number).unwrap_or(fallback)
}

fn flag(settings: &Snapshot, key: &str) -> bool {
    settings.get(key).and_then(SettingValue::as_bool).unwrap_or(false)
}

fn txt<'a>(settings: &'a Snapshot, key: &str) -> Option<&'a str> {
    settings.get(key).and_then(SettingValue::as_str)
}

/// Whole pixel counts render without a decimal point
fn fmt_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn font_stack(family: &str) -> &str {
    match family {
        "system" => {
            "-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Oxygen-Sans,Ubuntu,Cantarell,'Helvetica Neue',sans-serif"
        }
        "serif" => "Georgia,'Times New Roman',serif",
        "monospace" => "'SF Mono',Monaco,Consolas,'Courier New',monospace",
        other => other,
    }
}

fn admin_bar_css(settings: &Snapshot) -> String {
    let height = num(settings, "admin_bar.height", 32.0);
    let mut css = String::new();

    css.push_str("body.wp-admin #wpadminbar{position:fixed!important;top:0!important;left:0!important;right:0!important;z-index:99999!important;");
    if let Some(bg) = txt(settings, "admin_bar.bg_color") {
        css.push_str(&format!("background-color:{bg}!important;"));
    }
    css.push_str(&format!("height:{}px!important;}}", fmt_px(height)));

    css.push_str(&format!(
        "html.wp-toolbar{{padding-top:{}px!important;}}",
        fmt_px(height)
    ));

    if let Some(color) = txt(settings, "admin_bar.text_color") {
        css.push_str(&format!(
            "body.wp-admin #wpadminbar .ab-item,body.wp-admin #wpadminbar a.ab-item,body.wp-admin #wpadminbar > #wp-toolbar span.ab-label,body.wp-admin #wpadminbar > #wp-toolbar span.noticon{{color:{color}!important;}}"
        ));
    }

    if flag(settings, "visual_effects.admin_bar.glassmorphism") {
        let blur = num(settings, "visual_effects.admin_bar.blur_intensity", 20.0);
        css.push_str(&format!(
            "body.wp-admin #wpadminbar{{backdrop-filter:blur({0}px)!important;-webkit-backdrop-filter:blur({0}px)!important;background-color:rgba(35,40,45,0.8)!important;}}",
            fmt_px(blur)
        ));
    } else {
        // Explicitly disable so toggling off in preview takes effect
        css.push_str("body.wp-admin #wpadminbar{backdrop-filter:none!important;-webkit-backdrop-filter:none!important;}");
    }

    if flag(settings, "visual_effects.admin_bar.floating") {
        let margin = num(settings, "visual_effects.admin_bar.floating_margin", 8.0);
        let radius = num(settings, "visual_effects.admin_bar.border_radius", 8.0);
        css.push_str(&format!(
            "body.wp-admin #wpadminbar{{top:{0}px!important;left:{0}px!important;right:{0}px!important;width:calc(100% - {1}px)!important;border-radius:{2}px!important;}}",
            fmt_px(margin),
            fmt_px(margin * 2.0),
            fmt_px(radius)
        ));
        css.push_str(&format!(
            "html.wp-toolbar{{padding-top:{}px!important;}}",
            fmt_px(height + margin * 2.0)
        ));
    } else {
        css.push_str("body.wp-admin #wpadminbar{top:0!important;left:0!important;right:0!important;width:100%!important;border-radius:0!important;}");
    }

    css.push_str(&format!(
        "body.wp-admin #wpadminbar .ab-sub-wrapper{{top:{}px!important;}}",
        fmt_px(height)
    ));

    css
}

fn admin_menu_css(settings: &Snapshot) -> String {
    let mut css = String::new();

    css.push_str("body.wp-admin #adminmenu,body.wp-admin #adminmenuback,body.wp-admin #adminmenuwrap{");
    if let Some(bg) = txt(settings, "admin_menu.bg_color") {
        css.push_str(&format!("background-color:{bg}!important;"));
    }
    css.push('}');

    // WordPress default is 160px; only emit width overrides past that
    let width = num(settings, "admin_menu.width", 160.0);
    if width != 160.0 {
        css.push_str(&format!(
            "body.wp-admin:not(.folded) #adminmenu,body.wp-admin:not(.folded) #adminmenuback,body.wp-admin:not(.folded) #adminmenuwrap{{width:{}px!important;}}",
            fmt_px(width)
        ));
        css.push_str("body.wp-admin.folded #adminmenu,body.wp-admin.folded #adminmenuback,body.wp-admin.folded #adminmenuwrap{width:36px!important;}");
        css.push_str(&format!(
            "body.wp-admin:not(.folded) #wpcontent,body.wp-admin:not(.folded) #wpfooter{{margin-left:{}px!important;}}",
            fmt_px(width)
        ));
        css.push_str("body.wp-admin.folded #wpcontent,body.wp-admin.folded #wpfooter{margin-left:36px!important;}");
    }

    // Folded-mode fixes are unconditional; stock WordPress misaligns icons
    // once any menu styling is injected
    css.push_str("body.wp-admin.folded #adminmenu .wp-menu-image{width:36px!important;height:34px!important;display:flex!important;align-items:center!important;justify-content:center!important;overflow:hidden!important;}");
    css.push_str("body.wp-admin.folded #adminmenu .wp-menu-image:before{padding:0!important;margin:0!important;width:18px!important;height:18px!important;font-size:18px!important;line-height:1!important;display:block!important;}");
    css.push_str("body.wp-admin.folded #adminmenu li.menu-top{height:34px!important;min-height:34px!important;}");
    css.push_str("body.wp-admin.folded #adminmenu .wp-menu-image img{width:18px!important;height:18px!important;padding:0!important;}");
    css.push_str("body.wp-admin.folded #adminmenu .wp-submenu{position:absolute!important;left:36px!important;top:0!important;margin:0!important;padding:0!important;min-width:160px!important;z-index:9999!important;}");
    if let Some(bg) = txt(settings, "admin_menu.bg_color") {
        css.push_str(&format!(
            "body.wp-admin.folded #adminmenu .wp-submenu{{background-color:{bg}!important;box-shadow:2px 2px 5px rgba(0,0,0,0.1)!important;}}"
        ));
    }
    css.push_str("body.wp-admin.folded #adminmenu .wp-menu-name{display:none!important;}");

    if txt(settings, "admin_menu.height_mode") == Some("content") {
        css.push_str("body.wp-admin #adminmenuwrap,body.wp-admin #adminmenuback,body.wp-admin #adminmenumain{height:auto!important;min-height:0!important;bottom:auto!important;}");
        css.push_str("body.wp-admin #adminmenu{height:auto!important;min-height:0!important;position:relative!important;bottom:auto!important;}");
        css.push_str("body.wp-admin #adminmenu li.menu-top{height:auto!important;}");
    }

    if let Some(color) = txt(settings, "admin_menu.text_color") {
        css.push_str(&format!(
            "body.wp-admin #adminmenu a,body.wp-admin #adminmenu div.wp-menu-name{{color:{color}!important;}}"
        ));
    }
    if let Some(bg) = txt(settings, "admin_menu.hover_bg_color") {
        css.push_str(&format!(
            "body.wp-admin #adminmenu li.menu-top:hover,body.wp-admin #adminmenu li.opensub > a.menu-top,body.wp-admin #adminmenu li > a.menu-top:focus{{background-color:{bg}!important;}}"
        ));
    }
    if let Some(color) = txt(settings, "admin_menu.hover_text_color") {
        css.push_str(&format!(
            "body.wp-admin #adminmenu li.menu-top:hover a,body.wp-admin #adminmenu li.opensub > a.menu-top,body.wp-admin #adminmenu li > a.menu-top:focus{{color:{color}!important;}}"
        ));
    }

    let padding = txt(settings, "admin_menu.item_padding").unwrap_or("6px 12px");
    let font_size = num(settings, "admin_menu.font_size", 13.0);
    let line_height = num(settings, "admin_menu.line_height", 18.0);
    css.push_str(&format!(
        "body.wp-admin #adminmenu li.menu-top{{padding:{padding}!important;}}"
    ));
    css.push_str(&format!(
        "body.wp-admin #adminmenu a{{font-size:{}px!important;line-height:{}px!important;}}",
        fmt_px(font_size),
        fmt_px(line_height)
    ));

    css.push_str("body.wp-admin #adminmenu .wp-submenu{padding-left:12px!important;}");
    css.push_str("body.wp-admin #adminmenu .wp-submenu li{padding:5px 0!important;}");

    css
}

fn typography_block(settings: &Snapshot, prefix: &str, selector: &str) -> String {
    let mut rules = String::new();
    if let Some(size) = settings.get(&format!("{prefix}.font_size")).and_then(SettingValue::as_number) {
        rules.push_str(&format!("font-size:{}px!important;", fmt_px(size)));
    }
    if let Some(weight) = settings.get(&format!("{prefix}.font_weight")).and_then(SettingValue::as_number) {
        rules.push_str(&format!("font-weight:{}!important;", fmt_px(weight)));
    }
    if let Some(height) = settings.get(&format!("{prefix}.line_height")).and_then(SettingValue::as_number) {
        rules.push_str(&format!("line-height:{height}!important;"));
    }
    if let Some(spacing) = settings.get(&format!("{prefix}.letter_spacing")).and_then(SettingValue::as_number) {
        if spacing != 0.0 {
            rules.push_str(&format!("letter-spacing:{spacing}px!important;"));
        }
    }
    if let Some(transform) = txt(settings, &format!("{prefix}.text_transform")) {
        if transform != "none" {
            rules.push_str(&format!("text-transform:{transform}!important;"));
        }
    }
    if let Some(family) = txt(settings, &format!("{prefix}.font_family")) {
        rules.push_str(&format!("font-family:{}!important;", font_stack(family)));
    }
    if rules.is_empty() {
        String::new()
    } else {
        format!("{selector}{{{rules}}}")
    }
}

fn typography_css(settings: &Snapshot) -> String {
    let mut css = String::new();
    css.push_str(&typography_block(
        settings,
        "typography.admin_bar",
        "body.wp-admin #wpadminbar,body.wp-admin #wpadminbar .ab-item,body.wp-admin #wpadminbar > #wp-toolbar span.ab-label,body.wp-admin #wpadminbar > #wp-toolbar span.noticon",
    ));
    css.push_str(&typography_block(
        settings,
        "typography.admin_menu",
        "body.wp-admin #adminmenu a,body.wp-admin #adminmenu div.wp-menu-name,body.wp-admin #adminmenu .wp-submenu a",
    ));
    css.push_str(&typography_block(
        settings,
        "typography.content",
        "body.wp-admin #wpbody-content,body.wp-admin .wrap,body.wp-admin #wpbody-content p,body.wp-admin .wrap p",
    ));
    css
}

/// box-shadow from intensity, direction, blur, and color; `none` intensity
/// yields no shadow at all
fn calculate_shadow(settings: &Snapshot, prefix: &str) -> Option<String> {
    let intensity = txt(settings, &format!("{prefix}.shadow_intensity")).unwrap_or("none");
    if intensity == "none" {
        return None;
    }
    let direction = txt(settings, &format!("{prefix}.shadow_direction")).unwrap_or("bottom");
    let blur = num(settings, &format!("{prefix}.shadow_blur"), 10.0);
    let color = txt(settings, &format!("{prefix}.shadow_color")).unwrap_or("rgba(0,0,0,0.15)");

    let (base_x, base_y, spread) = match intensity {
        "medium" => (4.0, 4.0, 0.0),
        "strong" => (8.0, 8.0, 2.0),
        _ => (2.0, 2.0, 0.0),
    };
    let (dir_x, dir_y) = match direction {
        "top" => (0.0, -1.0),
        "right" => (1.0, 0.0),
        "left" => (-1.0, 0.0),
        "center" => (0.0, 0.0),
        _ => (0.0, 1.0),
    };

    Some(format!(
        "{}px {}px {}px {}px {}",
        fmt_px(base_x * dir_x),
        fmt_px(base_y * dir_y),
        fmt_px(blur),
        fmt_px(spread),
        color
    ))
}

fn element_effects(settings: &Snapshot, prefix: &str, selector: &str) -> String {
    let mut rules = String::new();
    let radius = num(settings, &format!("{prefix}.border_radius"), 0.0);
    if radius != 0.0 {
        rules.push_str(&format!("border-radius:{}px!important;", fmt_px(radius)));
    }
    if let Some(shadow) = calculate_shadow(settings, prefix) {
        rules.push_str(&format!("box-shadow:{shadow}!important;"));
    }
    if rules.is_empty() {
        String::new()
    } else {
        format!("{selector}{{{rules}}}")
    }
}

fn visual_effects_css(settings: &Snapshot) -> String {
    let mut css = String::new();
    css.push_str(&element_effects(
        settings,
        "visual_effects.admin_bar",
        "body.wp-admin #wpadminbar",
    ));
    css.push_str(&element_effects(
        settings,
        "visual_effects.admin_menu",
        "body.wp-admin #adminmenu a",
    ));
    css
}

fn dark_mode_css(settings: &Snapshot) -> String {
    if !flag(settings, "dark_mode.enabled") {
        return String::new();
    }
    format!(
        "body.wp-admin.{DARK_MODE_CLASS} #wpbody-content{{background-color:#1e1e1e!important;color:#e0e0e0!important;}}body.wp-admin.{DARK_MODE_CLASS} .wrap{{color:#e0e0e0!important;}}body.wp-admin.{DARK_MODE_CLASS} .postbox,body.wp-admin.{DARK_MODE_CLASS} .widefat{{background-color:#262626!important;color:#e0e0e0!important;border-color:#3a3a3a!important;}}"
    )
}

/// Concatenate every section for a snapshot, in `Section::ALL` order
pub fn generate_full(settings: &Snapshot) -> String {
    Section::ALL
        .iter()
        .map(|s| s.generate(settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Schema;

    fn defaults() -> Snapshot {
        Snapshot::from_entries(Schema::core().defaults())
    }

    #[test]
    fn test_generation_is_deterministic() {
        let snap = defaults();
        assert_eq!(generate_full(&snap), generate_full(&snap));
    }

    #[test]
    fn test_admin_bar_colors_and_height() {
        let snap = defaults()
            .with("admin_bar.bg_color", SettingValue::text("#336699"))
            .with("admin_bar.height", SettingValue::Number(40.0));
        let css = admin_bar_css(&snap);
        assert!(css.contains("background-color:#336699!important"));
        assert!(css.contains("height:40px!important"));
        assert!(css.contains("html.wp-toolbar{padding-top:40px!important;}"));
        assert!(css.contains(".ab-sub-wrapper{top:40px!important;}"));
    }

    #[test]
    fn test_glassmorphism_off_emits_disabling_rules() {
        let css = admin_bar_css(&defaults());
        assert!(css.contains("backdrop-filter:none!important"));

        let on = defaults()
            .with("visual_effects.admin_bar.glassmorphism", SettingValue::Toggle(true))
            .with("visual_effects.admin_bar.blur_intensity", SettingValue::Number(12.0));
        let css = admin_bar_css(&on);
        assert!(css.contains("backdrop-filter:blur(12px)!important"));
    }

    #[test]
    fn test_floating_bar_adjusts_toolbar_padding() {
        let snap = defaults()
            .with("visual_effects.admin_bar.floating", SettingValue::Toggle(true))
            .with("visual_effects.admin_bar.floating_margin", SettingValue::Number(10.0))
            .with("visual_effects.admin_bar.border_radius", SettingValue::Number(6.0));
        let css = admin_bar_css(&snap);
        assert!(css.contains("top:10px!important"));
        assert!(css.contains("width:calc(100% - 20px)!important"));
        assert!(css.contains("border-radius:6px!important"));
        // 32px bar + 2 * 10px margin
        assert!(css.contains("padding-top:52px!important"));
    }

    #[test]
    fn test_menu_default_width_emits_no_override() {
        let css = admin_menu_css(&defaults());
        assert!(!css.contains("margin-left:160px"));

        let wide = defaults().with("admin_menu.width", SettingValue::Number(220.0));
        let css = admin_menu_css(&wide);
        assert!(css.contains("width:220px!important"));
        assert!(css.contains("margin-left:220px!important"));
        assert!(css.contains("margin-left:36px!important"));
    }

    #[test]
    fn test_shadow_math() {
        let snap = defaults()
            .with("visual_effects.admin_menu.shadow_intensity", SettingValue::text("strong"))
            .with("visual_effects.admin_menu.shadow_direction", SettingValue::text("top"))
            .with("visual_effects.admin_menu.shadow_blur", SettingValue::Number(15.0))
            .with("visual_effects.admin_menu.shadow_color", SettingValue::text("rgba(0,0,0,0.3)"));
        let shadow = calculate_shadow(&snap, "visual_effects.admin_menu").unwrap();
        assert_eq!(shadow, "0px -8px 15px 2px rgba(0,0,0,0.3)");

        assert!(calculate_shadow(&defaults(), "visual_effects.admin_menu").is_none());
    }

    #[test]
    fn test_dark_mode_only_when_enabled() {
        assert!(dark_mode_css(&defaults()).is_empty());
        let on = defaults().with("dark_mode.enabled", SettingValue::Toggle(true));
        assert!(dark_mode_css(&on).contains(DARK_MODE_CLASS));
    }

    #[test]
    fn test_section_relevance() {
        assert!(Section::AdminBar.relevant("admin_bar.bg_color"));
        assert!(Section::AdminBar.relevant("visual_effects.admin_bar.floating"));
        assert!(!Section::AdminBar.relevant("admin_menu.bg_color"));
        assert!(Section::VisualEffects.relevant("visual_effects.admin_menu.shadow_blur"));
        assert!(!Section::Typography.relevant("dark_mode.enabled"));
    }
}
