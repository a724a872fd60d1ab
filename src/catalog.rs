//! Built-in palette and template catalogs
//!
//! Palettes are six-role color schemes plus direct admin bar/menu colors;
//! applying one merges those colors into the settings. Templates are broader
//! settings bundles covering colors, typography, and effects in one step.

use crate::settings::SettingValue;

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    pub text_secondary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub id: String,
    pub name: String,
    pub colors: PaletteColors,
    pub bar_bg: String,
    pub bar_text: String,
    pub menu_bg: String,
    pub menu_text: String,
    pub menu_hover_bg: String,
    pub menu_hover_text: String,
    pub is_custom: bool,
}

impl Palette {
    /// The settings entries applying this palette writes
    pub fn entries(&self) -> Vec<(String, SettingValue)> {
        vec![
            ("admin_bar.bg_color".into(), SettingValue::text(self.bar_bg.as_str())),
            ("admin_bar.text_color".into(), SettingValue::text(self.bar_text.as_str())),
            ("admin_menu.bg_color".into(), SettingValue::text(self.menu_bg.as_str())),
            ("admin_menu.text_color".into(), SettingValue::text(self.menu_text.as_str())),
            ("admin_menu.hover_bg_color".into(), SettingValue::text(self.menu_hover_bg.as_str())),
            ("admin_menu.hover_text_color".into(), SettingValue::text(self.menu_hover_text.as_str())),
            ("palettes.current".into(), SettingValue::text(self.id.as_str())),
        ]
    }
}

struct PaletteSpec {
    id: &'static str,
    name: &'static str,
    // primary, secondary, accent, background, text, text_secondary
    colors: [&'static str; 6],
    bar: (&'static str, &'static str),
    menu: (&'static str, &'static str, &'static str, &'static str),
}

const BUILTIN_PALETTES: &[PaletteSpec] = &[
    PaletteSpec {
        id: "professional-blue",
        name: "Professional Blue",
        colors: ["#4A90E2", "#50C9C3", "#7B68EE", "#F8FAFC", "#1E293B", "#64748B"],
        bar: ("#4A90E2", "#ffffff"),
        menu: ("#1E40AF", "#ffffff", "#3B82F6", "#E0E7FF"),
    },
    PaletteSpec {
        id: "creative-purple",
        name: "Creative Purple",
        colors: ["#8B5CF6", "#EC4899", "#F59E0B", "#FAF5FF", "#1F2937", "#6B7280"],
        bar: ("#8B5CF6", "#ffffff"),
        menu: ("#7C3AED", "#ffffff", "#8B5CF6", "#EDE9FE"),
    },
    PaletteSpec {
        id: "energetic-green",
        name: "Energetic Green",
        colors: ["#10B981", "#34D399", "#FBBF24", "#F0FDF4", "#064E3B", "#047857"],
        bar: ("#10B981", "#ffffff"),
        menu: ("#059669", "#ffffff", "#10B981", "#D1FAE5"),
    },
    PaletteSpec {
        id: "sunset",
        name: "Sunset",
        colors: ["#F97316", "#FB923C", "#FBBF24", "#FFF7ED", "#7C2D12", "#C2410C"],
        bar: ("#F97316", "#ffffff"),
        menu: ("#EA580C", "#ffffff", "#F97316", "#FED7AA"),
    },
    PaletteSpec {
        id: "dark-elegance",
        name: "Dark Elegance",
        colors: ["#1F2937", "#374151", "#60A5FA", "#111827", "#F9FAFB", "#D1D5DB"],
        bar: ("#1F2937", "#F9FAFB"),
        menu: ("#111827", "#F9FAFB", "#374151", "#60A5FA"),
    },
    PaletteSpec {
        id: "ocean-breeze",
        name: "Ocean Breeze",
        colors: ["#0EA5E9", "#06B6D4", "#22D3EE", "#F0F9FF", "#0C4A6E", "#0369A1"],
        bar: ("#0EA5E9", "#ffffff"),
        menu: ("#0284C7", "#ffffff", "#0EA5E9", "#E0F2FE"),
    },
    PaletteSpec {
        id: "rose-garden",
        name: "Rose Garden",
        colors: ["#E11D48", "#F43F5E", "#FB7185", "#FFF1F2", "#881337", "#BE123C"],
        bar: ("#E11D48", "#ffffff"),
        menu: ("#BE123C", "#ffffff", "#E11D48", "#FFE4E6"),
    },
    PaletteSpec {
        id: "forest-calm",
        name: "Forest Calm",
        colors: ["#16A34A", "#22C55E", "#84CC16", "#F7FEE7", "#14532D", "#166534"],
        bar: ("#16A34A", "#ffffff"),
        menu: ("#15803D", "#ffffff", "#16A34A", "#DCFCE7"),
    },
    PaletteSpec {
        id: "midnight-blue",
        name: "Midnight Blue",
        colors: ["#1E3A8A", "#3B82F6", "#60A5FA", "#EFF6FF", "#1E3A8A", "#1E40AF"],
        bar: ("#1E3A8A", "#ffffff"),
        menu: ("#1E40AF", "#ffffff", "#3B82F6", "#DBEAFE"),
    },
    PaletteSpec {
        id: "golden-hour",
        name: "Golden Hour",
        colors: ["#D97706", "#F59E0B", "#FBBF24", "#FFFBEB", "#78350F", "#92400E"],
        bar: ("#D97706", "#ffffff"),
        menu: ("#B45309", "#ffffff", "#D97706", "#FEF3C7"),
    },
];

pub fn builtin_palettes() -> Vec<Palette> {
    BUILTIN_PALETTES
        .iter()
        .map(|spec| Palette {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            colors: PaletteColors {
                primary: spec.colors[0].to_string(),
                secondary: spec.colors[1].to_string(),
                accent: spec.colors[2].to_string(),
                background: spec.colors[3].to_string(),
                text: spec.colors[4].to_string(),
                text_secondary: spec.colors[5].to_string(),
            },
            bar_bg: spec.bar.0.to_string(),
            bar_text: spec.bar.1.to_string(),
            menu_bg: spec.menu.0.to_string(),
            menu_text: spec.menu.1.to_string(),
            menu_hover_bg: spec.menu.2.to_string(),
            menu_hover_text: spec.menu.3.to_string(),
            is_custom: false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub settings: Vec<(String, SettingValue)>,
    pub is_custom: bool,
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    settings: Vec<(String, SettingValue)>,
) -> Template {
    let mut settings = settings;
    settings.push(("templates.current".to_string(), SettingValue::text(id)));
    Template {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        settings,
        is_custom: false,
    }
}

fn color(key: &str, value: &str) -> (String, SettingValue) {
    (key.to_string(), SettingValue::text(value))
}

fn number(key: &str, value: f64) -> (String, SettingValue) {
    (key.to_string(), SettingValue::Number(value))
}

fn toggle(key: &str, value: bool) -> (String, SettingValue) {
    (key.to_string(), SettingValue::Toggle(value))
}

pub fn builtin_templates() -> Vec<Template> {
    vec![
        template(
            "terminal",
            "Terminal Linux",
            "Hacker/Developer theme with matrix effects",
            "tech",
            vec![
                color("admin_bar.bg_color", "#0D1117"),
                color("admin_bar.text_color", "#3FB950"),
                color("admin_menu.bg_color", "#010409"),
                color("admin_menu.text_color", "#3FB950"),
                color("admin_menu.hover_bg_color", "#161B22"),
                color("admin_menu.hover_text_color", "#7EE787"),
                color("typography.admin_menu.font_family", "monospace"),
                color("typography.content.font_family", "monospace"),
            ],
        ),
        template(
            "gaming",
            "Gaming Cyberpunk",
            "Epic gaming theme with RGB neon effects",
            "gaming",
            vec![
                color("admin_bar.bg_color", "#0A0A23"),
                color("admin_bar.text_color", "#FF2E97"),
                color("admin_menu.bg_color", "#13132B"),
                color("admin_menu.text_color", "#00F0FF"),
                color("admin_menu.hover_bg_color", "#FF2E97"),
                color("admin_menu.hover_text_color", "#0A0A23"),
                color("visual_effects.admin_menu.shadow_intensity", "strong"),
                color("visual_effects.admin_menu.shadow_color", "rgba(255, 46, 151, 0.4)"),
            ],
        ),
        template(
            "floral",
            "Floral Natural",
            "Organic theme with pastel colors",
            "nature",
            vec![
                color("admin_bar.bg_color", "#F9A8D4"),
                color("admin_bar.text_color", "#500724"),
                color("admin_menu.bg_color", "#FDF2F8"),
                color("admin_menu.text_color", "#831843"),
                color("admin_menu.hover_bg_color", "#FBCFE8"),
                color("admin_menu.hover_text_color", "#500724"),
                number("visual_effects.admin_menu.border_radius", 12.0),
            ],
        ),
        template(
            "professional",
            "Professional Dark",
            "Corporate elegance with gold accents",
            "business",
            vec![
                color("admin_bar.bg_color", "#18181B"),
                color("admin_bar.text_color", "#D4AF37"),
                color("admin_menu.bg_color", "#27272A"),
                color("admin_menu.text_color", "#E4E4E7"),
                color("admin_menu.hover_bg_color", "#3F3F46"),
                color("admin_menu.hover_text_color", "#D4AF37"),
                color("visual_effects.admin_bar.shadow_intensity", "subtle"),
            ],
        ),
        template(
            "retro",
            "Retro 80s Synthwave",
            "Nostalgic 80s theme with vaporwave aesthetics",
            "retro",
            vec![
                color("admin_bar.bg_color", "#2D1B69"),
                color("admin_bar.text_color", "#FF71CE"),
                color("admin_menu.bg_color", "#1A0B3F"),
                color("admin_menu.text_color", "#01CDFE"),
                color("admin_menu.hover_bg_color", "#B967FF"),
                color("admin_menu.hover_text_color", "#1A0B3F"),
                number("visual_effects.admin_bar.border_radius", 0.0),
            ],
        ),
        template(
            "glass",
            "Glass Material",
            "Premium glassmorphism with prismatic effects",
            "modern",
            vec![
                color("admin_bar.bg_color", "#FFFFFF"),
                color("admin_bar.text_color", "#1E293B"),
                toggle("visual_effects.admin_bar.glassmorphism", true),
                number("visual_effects.admin_bar.blur_intensity", 24.0),
                toggle("visual_effects.admin_bar.floating", true),
                number("visual_effects.admin_bar.floating_margin", 10.0),
                number("visual_effects.admin_bar.border_radius", 12.0),
                toggle("visual_effects.admin_menu.glassmorphism", true),
            ],
        ),
        template(
            "gradient",
            "Gradient Flow",
            "Dynamic theme with flowing gradients",
            "modern",
            vec![
                color("admin_bar.bg_color", "#6366F1"),
                color("admin_bar.text_color", "#ffffff"),
                color("admin_menu.bg_color", "#4F46E5"),
                color("admin_menu.text_color", "#E0E7FF"),
                color("admin_menu.hover_bg_color", "#818CF8"),
                color("admin_menu.hover_text_color", "#1E1B4B"),
                color("visual_effects.admin_menu.shadow_intensity", "medium"),
            ],
        ),
        template(
            "minimal",
            "Minimalist Modern",
            "Clean design with focus on typography",
            "minimal",
            vec![
                color("admin_bar.bg_color", "#FFFFFF"),
                color("admin_bar.text_color", "#18181B"),
                color("admin_menu.bg_color", "#FAFAFA"),
                color("admin_menu.text_color", "#3F3F46"),
                color("admin_menu.hover_bg_color", "#F4F4F5"),
                color("admin_menu.hover_text_color", "#18181B"),
                number("typography.content.line_height", 1.7),
                color("visual_effects.admin_bar.shadow_intensity", "none"),
            ],
        ),
    ]
}
