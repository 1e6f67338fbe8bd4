use crate::error::Result;
use crate::present::LayoutKind;
use crate::settings::{load_settings, save_settings, settings_location, shellexpand_path};

pub fn run(file: Option<&str>, layout: Option<LayoutKind>) -> Result<()> {
    let mut settings = load_settings();

    if file.is_none() && layout.is_none() {
        println!("Settings: {}", settings_location().display());
        println!(
            "  default file: {}",
            settings.default_file.as_deref().unwrap_or("(none)")
        );
        println!("  layout:       {}", settings.layout.label());
        return Ok(());
    }

    if let Some(f) = file {
        let expanded = shellexpand_path(f);
        if !std::path::Path::new(&expanded).exists() {
            log::warn!("{expanded} does not exist yet");
        }
        settings.default_file = Some(expanded);
    }
    if let Some(l) = layout {
        settings.layout = l;
    }
    save_settings(&settings)?;
    println!("Saved settings to {}", settings_location().display());
    Ok(())
}
