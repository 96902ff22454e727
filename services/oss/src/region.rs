use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Region is an OSS deployment location.
///
/// Every region is reachable through an external endpoint and, from inside
/// the Aliyun network, an internal one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// oss-cn-hangzhou
    #[default]
    Hangzhou,
    /// oss-cn-qingdao
    Qingdao,
    /// oss-cn-beijing
    Beijing,
    /// oss-cn-hongkong
    Hongkong,
    /// oss-cn-shenzhen
    Shenzhen,
    /// oss-cn-shanghai
    Shanghai,
    /// oss-us-west-1
    USWest1,
    /// oss-ap-southeast-1
    APSouthEast1,
    /// Any other region identifier, used verbatim.
    Custom(String),
}

impl Region {
    /// The region identifier, for example `oss-cn-hangzhou`.
    pub fn as_str(&self) -> &str {
        match self {
            Region::Hangzhou => "oss-cn-hangzhou",
            Region::Qingdao => "oss-cn-qingdao",
            Region::Beijing => "oss-cn-beijing",
            Region::Hongkong => "oss-cn-hongkong",
            Region::Shenzhen => "oss-cn-shenzhen",
            Region::Shanghai => "oss-cn-shanghai",
            Region::USWest1 => "oss-us-west-1",
            Region::APSouthEast1 => "oss-ap-southeast-1",
            Region::Custom(v) => v,
        }
    }

    /// Host serving this region.
    pub fn host(&self, internal: bool) -> String {
        if internal {
            format!("{}-internal.aliyuncs.com", self.as_str())
        } else {
            format!("{}.aliyuncs.com", self.as_str())
        }
    }

    /// Base URL of this region's endpoint.
    pub fn endpoint(&self, internal: bool) -> String {
        format!("http://{}", self.host(internal))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        match value {
            "oss-cn-hangzhou" => Region::Hangzhou,
            "oss-cn-qingdao" => Region::Qingdao,
            "oss-cn-beijing" => Region::Beijing,
            "oss-cn-hongkong" => Region::Hongkong,
            "oss-cn-shenzhen" => Region::Shenzhen,
            "oss-cn-shanghai" => Region::Shanghai,
            "oss-us-west-1" => Region::USWest1,
            "oss-ap-southeast-1" => Region::APSouthEast1,
            v => Region::Custom(v.to_string()),
        }
    }
}

impl FromStr for Region {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Region::from(s))
    }
}
