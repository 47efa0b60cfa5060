//! Windows LANGID tables used by the MOBI locale field.

/// Primary language ids.
const MAIN_LANGUAGES: &[(u32, &str)] = &[
    (0, "NEUTRAL"),
    (1, "ARABIC"),
    (2, "BULGARIAN"),
    (3, "CATALAN"),
    (4, "CHINESE"),
    (5, "CZECH"),
    (6, "DANISH"),
    (7, "GERMAN"),
    (8, "GREEK"),
    (9, "ENGLISH"),
    (10, "SPANISH"),
    (11, "FINNISH"),
    (12, "FRENCH"),
    (13, "HEBREW"),
    (14, "HUNGARIAN"),
    (15, "ICELANDIC"),
    (16, "ITALIAN"),
    (17, "JAPANESE"),
    (18, "KOREAN"),
    (19, "DUTCH"),
    (20, "NORWEGIAN"),
    (21, "POLISH"),
    (22, "PORTUGUESE"),
    (23, "RHAETOROMANIC"),
    (24, "ROMANIAN"),
    (25, "RUSSIAN"),
    (26, "SERBIAN"),
    (27, "SLOVAK"),
    (28, "ALBANIAN"),
    (29, "SWEDISH"),
    (30, "THAI"),
    (31, "TURKISH"),
    (32, "URDU"),
    (33, "INDONESIAN"),
    (34, "UKRAINIAN"),
    (35, "BELARUSIAN"),
    (36, "SLOVENIAN"),
    (37, "ESTONIAN"),
    (38, "LATVIAN"),
    (39, "LITHUANIAN"),
    (41, "FARSI"),
    (42, "VIETNAMESE"),
    (43, "ARMENIAN"),
    (44, "AZERI"),
    (45, "BASQUE"),
    (46, "SORBIAN"),
    (47, "MACEDONIAN"),
    (48, "SUTU"),
    (49, "TSONGA"),
    (50, "TSWANA"),
    (52, "XHOSA"),
    (53, "ZULU"),
    (54, "AFRIKAANS"),
    (55, "GEORGIAN"),
    (56, "FAEROESE"),
    (57, "HINDI"),
    (58, "MALTESE"),
    (59, "SAMI"),
    (62, "MALAY"),
    (63, "KAZAK"),
    (65, "SWAHILI"),
    (67, "UZBEK"),
    (68, "TATAR"),
    (69, "BENGALI"),
    (70, "PUNJABI"),
    (71, "GUJARATI"),
    (72, "ORIYA"),
    (73, "TAMIL"),
    (74, "TELUGU"),
    (75, "KANNADA"),
    (76, "MALAYALAM"),
    (77, "ASSAMESE"),
    (78, "MARATHI"),
    (79, "SANSKRIT"),
    (87, "KONKANI"),
    (97, "NEPALI"),
];

/// Sub-language ids, keyed by `(language, sublanguage)`.
const SUB_LANGUAGES: &[((u32, u32), &str)] = &[
    ((4, 1), "CHINESE_TRADITIONAL"),
    ((4, 2), "CHINESE_SIMPLIFIED"),
    ((4, 3), "CHINESE_HONGKONG"),
    ((4, 4), "CHINESE_SINGAPORE"),
    ((7, 1), "GERMAN"),
    ((7, 2), "GERMAN_SWISS"),
    ((7, 3), "GERMAN_AUSTRIAN"),
    ((7, 4), "GERMAN_LUXEMBOURG"),
    ((7, 5), "GERMAN_LIECHTENSTEIN"),
    ((9, 1), "ENGLISH_US"),
    ((9, 2), "ENGLISH_UK"),
    ((9, 3), "ENGLISH_AUS"),
    ((9, 4), "ENGLISH_CAN"),
    ((9, 5), "ENGLISH_NZ"),
    ((9, 6), "ENGLISH_EIRE"),
    ((9, 7), "ENGLISH_SOUTH_AFRICA"),
    ((9, 8), "ENGLISH_JAMAICA"),
    ((9, 10), "ENGLISH_BELIZE"),
    ((9, 11), "ENGLISH_TRINIDAD"),
    ((9, 12), "ENGLISH_ZIMBABWE"),
    ((9, 13), "ENGLISH_PHILIPPINES"),
    ((10, 1), "SPANISH"),
    ((10, 2), "SPANISH_MEXICAN"),
    ((10, 3), "SPANISH_MODERN"),
    ((10, 4), "SPANISH_GUATEMALA"),
    ((10, 5), "SPANISH_COSTA_RICA"),
    ((10, 6), "SPANISH_PANAMA"),
    ((10, 11), "SPANISH_ARGENTINA"),
    ((10, 13), "SPANISH_CHILE"),
    ((12, 1), "FRENCH"),
    ((12, 2), "FRENCH_BELGIAN"),
    ((12, 3), "FRENCH_CANADIAN"),
    ((12, 4), "FRENCH_SWISS"),
    ((12, 5), "FRENCH_LUXEMBOURG"),
    ((12, 6), "FRENCH_MONACO"),
    ((16, 1), "ITALIAN"),
    ((16, 2), "ITALIAN_SWISS"),
    ((19, 1), "DUTCH"),
    ((19, 2), "DUTCH_BELGIAN"),
    ((20, 1), "NORWEGIAN_BOKMAL"),
    ((20, 2), "NORWEGIAN_NYNORSK"),
    ((22, 1), "PORTUGUESE_BRAZILIAN"),
    ((22, 2), "PORTUGUESE"),
    ((26, 1), "CROATIAN"),
    ((26, 2), "SERBIAN_LATIN"),
    ((26, 3), "SERBIAN_CYRILLIC"),
    ((29, 1), "SWEDISH"),
    ((29, 2), "SWEDISH_FINLAND"),
];

/// Split a MOBI locale code into `(language_id, sublanguage_id)`.
pub fn split_locale(code: u32) -> (u32, u32) {
    (code & 0xFF, (code >> 10) & 0xFF)
}

/// Name of a primary language id, defaulting to `ENGLISH`.
pub fn language_name(id: u32) -> &'static str {
    MAIN_LANGUAGES
        .iter()
        .find(|&&(k, _)| k == id)
        .map_or("ENGLISH", |&(_, name)| name)
}

/// Name of a sub-language, defaulting to `NEUTRAL`.
pub fn sublanguage_name(language: u32, sub: u32) -> &'static str {
    SUB_LANGUAGES
        .iter()
        .find(|&&(k, _)| k == (language, sub))
        .map_or("NEUTRAL", |&(_, name)| name)
}
