//! Button menus and the actions behind them.

use crate::media::{Quality, TargetFormat};

/// One inline button: a label and the data sent back when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            data: action.data(),
        }
    }
}

/// Rows of buttons.
pub type Menu = Vec<Vec<Button>>;

/// What a button press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BackToMain,
    ShowTools,
    ShowHelp,
    ModeDownload,
    ModeInfo,
    ModeConvert,
    ModeEdit,
    ModeImage,
    ModeZip,
    Download(Quality),
    DetailedInfo,
    Convert(TargetFormat),
    Trim,
    ExtractSegment,
    Compress,
    Enhance,
}

impl Action {
    /// Callback data carried by the button.
    pub fn data(&self) -> String {
        match self {
            Action::BackToMain => "back_to_main".to_string(),
            Action::ShowTools => "show_tools".to_string(),
            Action::ShowHelp => "show_help".to_string(),
            Action::ModeDownload => "mode_download".to_string(),
            Action::ModeInfo => "mode_info".to_string(),
            Action::ModeConvert => "mode_convert".to_string(),
            Action::ModeEdit => "mode_edit".to_string(),
            Action::ModeImage => "mode_image".to_string(),
            Action::ModeZip => "mode_zip".to_string(),
            Action::Download(q) => format!("download_{}", q.as_str()),
            Action::DetailedInfo => "get_detailed_info".to_string(),
            Action::Convert(f) => format!("convert_{}", f.extension()),
            Action::Trim => "edit_trim".to_string(),
            Action::ExtractSegment => "edit_extract".to_string(),
            Action::Compress => "process_compress".to_string(),
            Action::Enhance => "process_enhance".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "back_to_main" => Action::BackToMain,
            "show_tools" => Action::ShowTools,
            "show_help" => Action::ShowHelp,
            "mode_download" => Action::ModeDownload,
            "mode_info" => Action::ModeInfo,
            "mode_convert" => Action::ModeConvert,
            "mode_edit" => Action::ModeEdit,
            "mode_image" => Action::ModeImage,
            "mode_zip" => Action::ModeZip,
            "get_detailed_info" => Action::DetailedInfo,
            "edit_trim" => Action::Trim,
            "edit_extract" => Action::ExtractSegment,
            "process_compress" => Action::Compress,
            "process_enhance" => Action::Enhance,
            other => {
                if let Some(q) = other.strip_prefix("download_") {
                    Action::Download(Quality::parse(q)?)
                } else if let Some(f) = other.strip_prefix("convert_") {
                    Action::Convert(TargetFormat::parse(f)?)
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }
}

pub fn main_menu() -> Menu {
    vec![
        vec![
            Button::new("📹 Download video", Action::ModeDownload),
            Button::new("ℹ️ Media info", Action::ModeInfo),
        ],
        vec![
            Button::new("🔄 Convert files", Action::ModeConvert),
            Button::new("✂️ Edit video", Action::ModeEdit),
        ],
        vec![
            Button::new("🖼️ Images", Action::ModeImage),
            Button::new("📦 Zip files", Action::ModeZip),
        ],
        vec![
            Button::new("🛠️ All tools", Action::ShowTools),
            Button::new("❓ Help", Action::ShowHelp),
        ],
    ]
}

pub fn download_menu() -> Menu {
    vec![
        vec![
            Button::new("🎬 4K Ultra", Action::Download(Quality::Ultra)),
            Button::new("📹 HD 1080p", Action::Download(Quality::High)),
        ],
        vec![
            Button::new("📱 HD 720p", Action::Download(Quality::Medium)),
            Button::new("📺 SD 480p", Action::Download(Quality::Low)),
        ],
        vec![
            Button::new("🎵 High quality audio", Action::Download(Quality::AudioHigh)),
            Button::new("🎶 Normal audio", Action::Download(Quality::AudioNormal)),
        ],
        vec![
            Button::new("📊 Detailed info", Action::DetailedInfo),
            Button::new("⬅️ Back", Action::BackToMain),
        ],
    ]
}

pub fn processing_menu() -> Menu {
    vec![
        vec![
            Button::new("🎵 To MP3", Action::Convert(TargetFormat::Mp3)),
            Button::new("📹 To MP4", Action::Convert(TargetFormat::Mp4)),
        ],
        vec![
            Button::new("🎼 To WAV", Action::Convert(TargetFormat::Wav)),
            Button::new("🎬 To AVI", Action::Convert(TargetFormat::Avi)),
        ],
        vec![
            Button::new("✂️ Trim", Action::Trim),
            Button::new("📤 Extract part", Action::ExtractSegment),
        ],
        vec![
            Button::new("🗜️ Compress", Action::Compress),
            Button::new("✨ Enhance", Action::Enhance),
        ],
        vec![Button::new("⬅️ Back", Action::BackToMain)],
    ]
}

pub fn back_menu() -> Menu {
    vec![vec![Button::new("⬅️ Back", Action::BackToMain)]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_menu_button_parses_back() {
        for menu in [main_menu(), download_menu(), processing_menu(), back_menu()] {
            for button in menu.iter().flatten() {
                let action = Action::parse(&button.data);
                assert!(action.is_some(), "unparsed {}", button.data);
                assert_eq!(action.map(|a| a.data()).as_deref(), Some(button.data.as_str()));
            }
        }
    }

    #[test]
    fn test_callback_data_names() {
        assert_eq!(Action::parse("download_audio_high"), Some(Action::Download(Quality::AudioHigh)));
        assert_eq!(Action::parse("convert_wav"), Some(Action::Convert(TargetFormat::Wav)));
        assert_eq!(Action::parse("download_8k"), None);
        assert_eq!(Action::parse("convert_flac"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn test_callback_data_fits_telegram_limit() {
        for menu in [main_menu(), download_menu(), processing_menu()] {
            assert!(menu.iter().flatten().all(|b| b.data.len() <= 64));
        }
    }
}
