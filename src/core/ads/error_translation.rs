// Rewrites the Ads API messages users hit most often into something actionable.

const TRANSLATIONS: &[(&str, &str)] = &[
    (
        "Cannot use empty field mask in update operation.",
        "Failed to replace asset. e.g. Cannot find the asset to be replaced.",
    ),
    (
        "Too many.",
        "Too many. The AdGroup has no space for this asset. ",
    ),
    ("Too short.", "YouTube id is too short."),
    ("Too long.", "Asset name is too long."),
    (
        "The error code is not in this version.",
        "Please check if there is policy issues in the campaign or adgroup.(e.g. disapproved assets)",
    ),
];

pub fn translate_ads_error(message: &str) -> String {
    TRANSLATIONS
        .iter()
        .find(|(raw, _)| *raw == message)
        .map(|(_, friendly)| friendly.to_string())
        .unwrap_or_else(|| message.to_string())
}
