//! Interactive prompts for download parameters

use dialoguer::Input;

use super::CliError;

/// Parameters gathered on the terminal before a run.
#[derive(Debug)]
pub struct DownloadParams {
    /// Country whose mines to download
    pub country: String,
    /// Listing page size
    pub page_size: u32,
}

/// Ask for the country and page size interactively.
///
/// Used when `--country` is not on the command line. The page size default
/// comes from the loaded configuration.
pub fn ask_download_params(default_page_size: u32) -> Result<DownloadParams, CliError> {
    let country: String = Input::new()
        .with_prompt("Country")
        .default("Iran".to_string())
        .interact_text()?;

    let page_size: u32 = Input::new()
        .with_prompt("Records per page")
        .default(default_page_size)
        .validate_with(|value: &u32| {
            if *value == 0 {
                Err("page size must be at least 1")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(DownloadParams {
        country: country.trim().to_string(),
        page_size,
    })
}
