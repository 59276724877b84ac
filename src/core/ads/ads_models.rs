use std::fmt;
use std::str::FromStr;

/// Creative type as written in the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreativeType {
    Headline,
    Description,
    Image,
    Video,
}

impl CreativeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreativeType::Headline => "HEADLINE",
            CreativeType::Description => "DESCRIPTION",
            CreativeType::Image => "IMAGE",
            CreativeType::Video => "VIDEO",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CreativeType::Headline | CreativeType::Description)
    }

    /// `ad_group_ad_asset_view.field_type` value for this creative.
    pub fn field_type(&self) -> &'static str {
        match self {
            CreativeType::Headline => "HEADLINE",
            CreativeType::Description => "DESCRIPTION",
            CreativeType::Image => "MARKETING_IMAGE",
            CreativeType::Video => "YOUTUBE_VIDEO",
        }
    }

    /// Fewest assets of this type an ad group must keep after a removal.
    pub fn minimum_in_ad_group(&self) -> u32 {
        match self {
            CreativeType::Headline => 2,
            CreativeType::Description => 2,
            CreativeType::Image => 1,
            CreativeType::Video => 5,
        }
    }

    /// Count at which a new upload first needs room made for it.
    pub fn ad_group_limit(&self) -> u32 {
        if self.is_text() {
            5
        } else {
            20
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            CreativeType::Headline => "headlines",
            CreativeType::Description => "descriptions",
            CreativeType::Image => "images",
            CreativeType::Video => "videos",
        }
    }

    pub fn not_enough_message(&self) -> String {
        format!(
            "Not enough {} in the AdGroup. The number of {} should be greater than {}",
            self.plural(),
            self.as_str().to_lowercase(),
            self.minimum_in_ad_group()
        )
    }
}

impl FromStr for CreativeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HEADLINE" => Ok(CreativeType::Headline),
            "DESCRIPTION" => Ok(CreativeType::Description),
            "IMAGE" => Ok(CreativeType::Image),
            "VIDEO" => Ok(CreativeType::Video),
            other => Err(format!("Unknown creative type: {}", other)),
        }
    }
}

impl fmt::Display for CreativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ad shapes app campaigns use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdType {
    /// App installs (ACi).
    AppAd,
    /// App engagement (ACe).
    AppEngagementAd,
}

impl AdType {
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "APP_AD" => Some(AdType::AppAd),
            "APP_ENGAGEMENT_AD" => Some(AdType::AppEngagementAd),
            _ => None,
        }
    }

    /// Key of the ad payload in REST bodies.
    pub fn payload_key(&self) -> &'static str {
        match self {
            AdType::AppAd => "appAd",
            AdType::AppEngagementAd => "appEngagementAd",
        }
    }

    fn mask_prefix(&self) -> &'static str {
        match self {
            AdType::AppAd => "app_ad",
            AdType::AppEngagementAd => "app_engagement_ad",
        }
    }

    /// REST (camelCase) name of the list that holds `creative` assets.
    pub fn list_field(&self, creative: CreativeType) -> &'static str {
        match (self, creative) {
            (_, CreativeType::Headline) => "headlines",
            (_, CreativeType::Description) => "descriptions",
            (_, CreativeType::Image) => "images",
            (AdType::AppAd, CreativeType::Video) => "youtubeVideos",
            (AdType::AppEngagementAd, CreativeType::Video) => "videos",
        }
    }

    pub fn update_mask(&self, creative: CreativeType) -> String {
        let field = match (self, creative) {
            (AdType::AppAd, CreativeType::Video) => "youtube_videos",
            _ => self.list_field(creative),
        };
        format!("{}.{}", self.mask_prefix(), field)
    }
}

/// An ad group's single app ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdGroupAd {
    pub ad_id: String,
    pub ad_type: AdType,
}

/// Asset lists of one app ad. Text assets hold the text, media assets the asset resource name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdAssets {
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
}

impl AdAssets {
    pub fn list(&self, creative: CreativeType) -> &Vec<String> {
        match creative {
            CreativeType::Headline => &self.headlines,
            CreativeType::Description => &self.descriptions,
            CreativeType::Image => &self.images,
            CreativeType::Video => &self.videos,
        }
    }

    pub fn list_mut(&mut self, creative: CreativeType) -> &mut Vec<String> {
        match creative {
            CreativeType::Headline => &mut self.headlines,
            CreativeType::Description => &mut self.descriptions,
            CreativeType::Image => &mut self.images,
            CreativeType::Video => &mut self.videos,
        }
    }

    pub fn counts(&self) -> AssetCounts {
        AssetCounts {
            headlines: self.headlines.len() as u32,
            descriptions: self.descriptions.len() as u32,
            images: self.images.len() as u32,
            videos: self.videos.len() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCounts {
    pub headlines: u32,
    pub descriptions: u32,
    pub images: u32,
    pub videos: u32,
}

impl AssetCounts {
    pub fn of(&self, creative: CreativeType) -> u32 {
        match creative {
            CreativeType::Headline => self.headlines,
            CreativeType::Description => self.descriptions,
            CreativeType::Image => self.images,
            CreativeType::Video => self.videos,
        }
    }
}

/// `ad_group_ad_asset_view.performance_label`. Ordering is LOW < GOOD < BEST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceLabel {
    Low,
    Good,
    Best,
}

impl PerformanceLabel {
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(PerformanceLabel::Low),
            "GOOD" => Some(PerformanceLabel::Good),
            "BEST" => Some(PerformanceLabel::Best),
            _ => None,
        }
    }
}

/// One row of the 14 day asset performance report.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPerformance {
    pub asset: String,
    pub label: PerformanceLabel,
    pub cost_micros: i64,
    pub conversions: f64,
}

/// One row of the metric report the remover evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMetrics {
    /// Text for text assets, asset resource name for media.
    pub asset_id: String,
    pub label: Option<PerformanceLabel>,
    pub impressions: i64,
    pub conversions: f64,
    pub conversions_value: f64,
    pub ctr: f64,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerClient {
    pub customer_id: String,
    pub level: u32,
    pub manager: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignAdGroup {
    pub campaign_id: String,
    pub campaign_name: String,
    pub app_id: String,
    pub ad_group_id: String,
    pub ad_group_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub resource_name: String,
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creative_type_parses_case_insensitively() {
        assert_eq!("headline".parse::<CreativeType>(), Ok(CreativeType::Headline));
        assert_eq!(" Video ".parse::<CreativeType>(), Ok(CreativeType::Video));
        assert!("banner".parse::<CreativeType>().is_err());
    }

    #[test]
    fn update_masks_follow_ad_type() {
        assert_eq!(
            AdType::AppAd.update_mask(CreativeType::Video),
            "app_ad.youtube_videos"
        );
        assert_eq!(
            AdType::AppEngagementAd.update_mask(CreativeType::Video),
            "app_engagement_ad.videos"
        );
        assert_eq!(
            AdType::AppEngagementAd.update_mask(CreativeType::Headline),
            "app_engagement_ad.headlines"
        );
        assert_eq!(AdType::AppAd.list_field(CreativeType::Video), "youtubeVideos");
    }

    #[test]
    fn not_enough_message_names_minimum() {
        assert_eq!(
            CreativeType::Headline.not_enough_message(),
            "Not enough headlines in the AdGroup. The number of headline should be greater than 2"
        );
        assert_eq!(
            CreativeType::Video.not_enough_message(),
            "Not enough videos in the AdGroup. The number of video should be greater than 5"
        );
    }

    #[test]
    fn labels_order_low_to_best() {
        assert!(PerformanceLabel::Low < PerformanceLabel::Good);
        assert!(PerformanceLabel::Good < PerformanceLabel::Best);
    }
}
