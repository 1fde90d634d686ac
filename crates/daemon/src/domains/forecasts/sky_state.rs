use serde::Deserialize;

/// Language a sky description is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    #[default]
    #[serde(alias = "gl")]
    Gal,
}

impl Language {
    /// Word appended to a description for the night variant of a code.
    pub fn night_suffix(&self) -> &'static str {
        match self {
            Language::Es => "noche",
            Language::Gal => "noite",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "gal" | "gl" => Ok(Language::Gal),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// AEMET icon codes with their day descriptions, (code, es, gal).
/// https://www.aemet.es/es/eltiempo/prediccion/espana/ayuda
pub const SKY_STATE_CODES: &[(u8, &str, &str)] = &[
    (11, "Despejado", "Despexado"),
    (12, "Poco nuboso", "Pouco nubrado"),
    (13, "Intervalos nubosos", "Intervalos nubrados"),
    (14, "Nuboso", "Nubrado"),
    (15, "Muy nuboso", "Moi nubrado"),
    (16, "Cubierto", "Cuberto"),
    (17, "Nubes altas", "Nubes altas"),
    (23, "Intervalos nubosos con lluvia", "Intervalos nubrados con choiva"),
    (24, "Nuboso con lluvia", "Nubrado con choiva"),
    (25, "Muy nuboso con lluvia", "Moi nubrado con choiva"),
    (26, "Cubierto con lluvia", "Cuberto con choiva"),
    (33, "Intervalos nubosos con nieve", "Intervalos nubrados con neve"),
    (34, "Nuboso con nieve", "Nubrado con neve"),
    (35, "Muy nuboso con nieve", "Moi nubrado con neve"),
    (36, "Cubierto con nieve", "Cuberto con neve"),
    (
        43,
        "Intervalos nubosos con lluvia escasa",
        "Intervalos nubrados con choiva escasa",
    ),
    (44, "Nuboso con lluvia escasa", "Nubrado con choiva escasa"),
    (45, "Muy nuboso con lluvia escasa", "Moi nubrado con choiva escasa"),
    (46, "Cubierto con lluvia escasa", "Cuberto con choiva escasa"),
    (51, "Intervalos nubosos con tormenta", "Intervalos nubrados con tormenta"),
    (52, "Nuboso con tormenta", "Nubrado con tormenta"),
    (53, "Muy nuboso con tormenta", "Moi nubrado con tormenta"),
    (54, "Cubierto con tormenta", "Cuberto con tormenta"),
    (
        61,
        "Intervalos nubosos con tormenta y lluvia escasa",
        "Intervalos nubrados con tormenta e choiva escasa",
    ),
    (
        62,
        "Nuboso con tormenta y lluvia escasa",
        "Nubrado con tormenta e choiva escasa",
    ),
    (
        63,
        "Muy nuboso con tormenta y lluvia escasa",
        "Moi nubrado con tormenta e choiva escasa",
    ),
    (
        64,
        "Cubierto con tormenta y lluvia escasa",
        "Cuberto con tormenta e choiva escasa",
    ),
    (71, "Intervalos nubosos con nieve escasa", "Intervalos nubrados con neve escasa"),
    (72, "Nuboso con nieve escasa", "Nubrado con neve escasa"),
    (73, "Muy nuboso con nieve escasa", "Moi nubrado con neve escasa"),
    (74, "Cubierto con nieve escasa", "Cuberto con neve escasa"),
    (81, "Niebla", "Néboa"),
    (82, "Bruma", "Brétema"),
    (83, "Calima", ""),
];

/// True when the code carries the night marker, e.g. "14n".
pub fn is_night(code: &str) -> bool {
    code.trim().ends_with('n')
}

/// Day description for a sky code. A trailing "n" is ignored; a blank or
/// unknown code describes as "".
pub fn describe(code: Option<&str>, language: Language) -> &'static str {
    let Some(code) = code else {
        return "";
    };
    let Ok(code) = code.trim().trim_end_matches('n').parse::<u8>() else {
        return "";
    };
    SKY_STATE_CODES
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|(_, es, gal)| match language {
            Language::Es => *es,
            Language::Gal => *gal,
        })
        .unwrap_or_default()
}
