//! Language tags and display hues.

/// Fallback tag for extensions we do not recognise.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("java", "java"),
    ("go", "go"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("php", "php"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("cc", "cpp"),
    ("cs", "csharp"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("html", "html"),
    ("htm", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("sass", "scss"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("zsh", "shell"),
    ("sql", "sql"),
];

/// Hue (0-360) used to tint buildings of each language.
const LANGUAGE_HUES: &[(&str, u16)] = &[
    ("python", 210),
    ("javascript", 50),
    ("typescript", 200),
    ("java", 30),
    ("go", 180),
    ("rust", 15),
    ("ruby", 0),
    ("php", 260),
    ("c", 220),
    ("cpp", 220),
    ("csharp", 270),
    ("swift", 25),
    ("kotlin", 280),
    ("scala", 0),
    ("html", 15),
    ("css", 200),
    ("scss", 330),
    ("json", 45),
    ("yaml", 120),
    ("markdown", 150),
    ("shell", 100),
    ("sql", 190),
];

/// Language implied by the file name's extension, case-insensitively.
pub fn language_for_path(file_name: &str) -> &'static str {
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return UNKNOWN_LANGUAGE;
    };
    if stem.is_empty() {
        // dotfiles such as `.gitignore`
        return UNKNOWN_LANGUAGE;
    }
    let extension = extension.to_ascii_lowercase();
    EXTENSION_LANGUAGES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
        .unwrap_or(UNKNOWN_LANGUAGE)
}

pub fn language_hue(language: &str) -> u16 {
    let language = language.to_ascii_lowercase();
    LANGUAGE_HUES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, hue)| *hue)
        .unwrap_or(0)
}
