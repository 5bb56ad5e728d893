//! Built-in UI strings (everything that is not user-supplied copy).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Language;

/// Key of a built-in string; rendered as `data-cookie-i18n="<key>"` on the element
/// holding it so the runtime can swap languages.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum I18nKey {
    PreferencesTitle,
    PreferencesIntro,
    AcceptAll,
    SavePreferences,
    Close,
    AlwaysActive,
    NecessaryTitle,
    NecessaryDescription,
    FunctionalityTitle,
    FunctionalityDescription,
    AnalyticsTitle,
    AnalyticsDescription,
    TargetingTitle,
    TargetingDescription,
    SocialTitle,
    SocialDescription,
    SettingsButton,
}

impl I18nKey {
    pub const ALL: [Self; 17] = [
        Self::PreferencesTitle,
        Self::PreferencesIntro,
        Self::AcceptAll,
        Self::SavePreferences,
        Self::Close,
        Self::AlwaysActive,
        Self::NecessaryTitle,
        Self::NecessaryDescription,
        Self::FunctionalityTitle,
        Self::FunctionalityDescription,
        Self::AnalyticsTitle,
        Self::AnalyticsDescription,
        Self::TargetingTitle,
        Self::TargetingDescription,
        Self::SocialTitle,
        Self::SocialDescription,
        Self::SettingsButton,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreferencesTitle => "preferencesTitle",
            Self::PreferencesIntro => "preferencesIntro",
            Self::AcceptAll => "acceptAll",
            Self::SavePreferences => "savePreferences",
            Self::Close => "close",
            Self::AlwaysActive => "alwaysActive",
            Self::NecessaryTitle => "necessaryTitle",
            Self::NecessaryDescription => "necessaryDescription",
            Self::FunctionalityTitle => "functionalityTitle",
            Self::FunctionalityDescription => "functionalityDescription",
            Self::AnalyticsTitle => "analyticsTitle",
            Self::AnalyticsDescription => "analyticsDescription",
            Self::TargetingTitle => "targetingTitle",
            Self::TargetingDescription => "targetingDescription",
            Self::SocialTitle => "socialTitle",
            Self::SocialDescription => "socialDescription",
            Self::SettingsButton => "settingsButton",
        }
    }
}

/// Languages the built-in strings exist in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
}

impl Locale {
    pub const ALL: [Self; 2] = [Self::En, Self::Fr];

    /// Locale used for server-side rendering; `auto` renders English and lets the
    /// runtime switch after detecting the browser locale.
    pub fn for_render(language: Language) -> Self {
        match language {
            Language::Fr => Self::Fr,
            Language::En | Language::Auto => Self::En,
        }
    }

    pub fn get(self, key: I18nKey) -> &'static str {
        match self {
            Self::En => english(key),
            Self::Fr => french(key),
        }
    }

    /// Every string of this locale keyed by wire name.
    pub fn table(self) -> BTreeMap<&'static str, &'static str> {
        I18nKey::ALL
            .iter()
            .map(|k| (k.as_str(), self.get(*k)))
            .collect()
    }
}

/// `{ "en": {...}, "fr": {...} }` as embedded into the runtime.
pub fn translation_tables() -> BTreeMap<Locale, BTreeMap<&'static str, &'static str>> {
    Locale::ALL.iter().map(|l| (*l, l.table())).collect()
}

fn english(key: I18nKey) -> &'static str {
    match key {
        I18nKey::PreferencesTitle => "Cookie Preferences",
        I18nKey::PreferencesIntro => {
            "Choose which cookies you allow. You can change these settings at any time."
        }
        I18nKey::AcceptAll => "Accept All",
        I18nKey::SavePreferences => "Save Preferences",
        I18nKey::Close => "Close",
        I18nKey::AlwaysActive => "Always active",
        I18nKey::NecessaryTitle => "Strictly Necessary",
        I18nKey::NecessaryDescription => {
            "Required for the website to function. These cannot be switched off."
        }
        I18nKey::FunctionalityTitle => "Functionality",
        I18nKey::FunctionalityDescription => {
            "Remember your choices and provide enhanced, personalized features."
        }
        I18nKey::AnalyticsTitle => "Performance & Analytics",
        I18nKey::AnalyticsDescription => {
            "Help us understand how visitors use the site so we can improve it."
        }
        I18nKey::TargetingTitle => "Targeting & Advertising",
        I18nKey::TargetingDescription => {
            "Used to deliver relevant ads and measure the effectiveness of campaigns."
        }
        I18nKey::SocialTitle => "Social Media",
        I18nKey::SocialDescription => {
            "Enable sharing and embedded content from social networks."
        }
        I18nKey::SettingsButton => "Cookie Settings",
    }
}

fn french(key: I18nKey) -> &'static str {
    match key {
        I18nKey::PreferencesTitle => "Préférences de témoins",
        I18nKey::PreferencesIntro => {
            "Choisissez les témoins que vous autorisez. Vous pouvez modifier ces paramètres à tout moment."
        }
        I18nKey::AcceptAll => "Tout accepter",
        I18nKey::SavePreferences => "Enregistrer mes choix",
        I18nKey::Close => "Fermer",
        I18nKey::AlwaysActive => "Toujours actifs",
        I18nKey::NecessaryTitle => "Strictement nécessaires",
        I18nKey::NecessaryDescription => {
            "Indispensables au fonctionnement du site. Ils ne peuvent pas être désactivés."
        }
        I18nKey::FunctionalityTitle => "Fonctionnalité",
        I18nKey::FunctionalityDescription => {
            "Mémorisent vos choix et offrent des fonctionnalités améliorées et personnalisées."
        }
        I18nKey::AnalyticsTitle => "Performance et statistiques",
        I18nKey::AnalyticsDescription => {
            "Nous aident à comprendre l'utilisation du site afin de l'améliorer."
        }
        I18nKey::TargetingTitle => "Ciblage et publicité",
        I18nKey::TargetingDescription => {
            "Servent à afficher des publicités pertinentes et à mesurer l'efficacité des campagnes."
        }
        I18nKey::SocialTitle => "Réseaux sociaux",
        I18nKey::SocialDescription => {
            "Permettent le partage et l'affichage de contenus provenant des réseaux sociaux."
        }
        I18nKey::SettingsButton => "Paramètres des témoins",
    }
}
