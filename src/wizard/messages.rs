#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Indonesian,
}

/// User-facing strings for toasts and advisory status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    language: Language,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new(Language::English)
    }
}

impl MessageCatalog {
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn for_language(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::new(Language::English)),
            "id" | "indonesian" | "bahasa" => Some(Self::new(Language::Indonesian)),
            _ => None,
        }
    }

    pub const fn language(&self) -> Language {
        self.language
    }

    pub fn missing_field(&self, label: &str) -> String {
        match self.language {
            Language::English => format!("Please fill {label} first"),
            Language::Indonesian => format!("Harap isi {label} terlebih dahulu."),
        }
    }

    pub fn geocode_failed(&self) -> String {
        match self.language {
            Language::English => {
                "Could not resolve city/district from the map, please fill them in manually."
                    .to_string()
            }
            Language::Indonesian => {
                "Gagal mengambil kota/kecamatan dari peta, isi manual.".to_string()
            }
        }
    }

    pub fn submission_failed(&self, detail: &str) -> String {
        match self.language {
            Language::English => {
                format!("Prediction failed ({detail}). Your answers are kept, please try again.")
            }
            Language::Indonesian => {
                format!("Prediksi gagal ({detail}). Data tetap tersimpan, silakan coba lagi.")
            }
        }
    }

    pub fn locating(&self) -> &'static str {
        match self.language {
            Language::English => "Resolving city/district from the selected point...",
            Language::Indonesian => "Mengambil kota/kecamatan dari titik...",
        }
    }

    pub fn pick_hint(&self) -> &'static str {
        match self.language {
            Language::English => "Pick a point on the map to choose a location.",
            Language::Indonesian => "Klik peta untuk memilih lokasi.",
        }
    }
}
