use std::collections::HashSet;

use crate::config::Config;
use crate::types::investor::normalize;
use crate::types::SearchQuery;

/// 根据行业与地区配置生成搜索查询
///
/// 纯函数：同样的配置总是得到同样顺序的查询。覆盖四个方向：
/// 行业VC、按城市细分、按阶段细分、家族办公室等另类资本。
pub fn plan_queries(config: &Config) -> Vec<SearchQuery> {
    let region = config.region();
    let industries = config.industry_descriptors();
    let sectors = industries.join(", ");

    let mut candidates: Vec<String> = Vec::new();

    for industry in &industries {
        candidates.push(format!(
            "{} venture capital firms investing in {}",
            region, industry
        ));
    }

    let cities: Vec<&str> = config
        .region_cities
        .iter()
        .map(|city| city.trim())
        .filter(|city| !city.is_empty())
        .collect();
    if cities.is_empty() {
        candidates.push(format!(
            "active startup investors headquartered in {} backing {}",
            region, sectors
        ));
    }
    for city in cities {
        candidates.push(format!(
            "angel investors and VC partners based in {}, {} backing {} startups",
            city, region, sectors
        ));
    }

    candidates.push(format!(
        "pre-seed and seed stage investors in {} funding {} startups",
        region, sectors
    ));
    candidates.push(format!(
        "Series A investors in {} leading rounds in {} companies",
        region, sectors
    ));

    candidates.push(format!(
        "family offices in {} investing in {} startups",
        region, sectors
    ));
    candidates.push(format!(
        "corporate venture capital arms and angel networks in {} investing in {}",
        region, sectors
    ));

    candidates.extend(config.custom_queries.iter().cloned());

    let mut seen = HashSet::new();
    let mut queries: Vec<SearchQuery> = candidates
        .into_iter()
        .map(|query| query.trim().to_string())
        .filter(|query| !query.is_empty())
        .filter(|query| seen.insert(normalize(query)))
        .map(SearchQuery::new)
        .collect();

    if let Some(max_queries) = config.max_queries {
        queries.truncate(max_queries);
    }
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(queries: &[SearchQuery]) -> Vec<String> {
        queries.iter().map(|q| q.as_str().to_lowercase()).collect()
    }

    #[test]
    fn test_default_plan_covers_all_axes() {
        let queries = texts(&plan_queries(&Config::default()));

        assert!(queries.iter().any(|q| q.contains("venture capital firms")));
        assert!(queries.iter().any(|q| q.contains("dubai")));
        assert!(queries.iter().any(|q| q.contains("abu dhabi")));
        assert!(queries.iter().any(|q| q.contains("seed stage")));
        assert!(queries.iter().any(|q| q.contains("series a")));
        assert!(queries.iter().any(|q| q.contains("family offices")));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let config = Config::default();
        assert_eq!(plan_queries(&config), plan_queries(&config));
    }

    #[test]
    fn test_empty_industry_still_yields_queries() {
        let config = Config {
            target_industry: String::new(),
            target_region: String::new(),
            region_cities: vec![],
            ..Default::default()
        };
        let queries = texts(&plan_queries(&config));

        assert!(queries.len() >= 4);
        assert!(queries.iter().all(|q| q.contains("uae")));
        assert!(queries.iter().any(|q| q.contains("technology startups")));
    }

    #[test]
    fn test_one_general_query_per_industry() {
        let config = Config {
            target_industry: "fintech, healthtech".to_string(),
            ..Default::default()
        };
        let queries = texts(&plan_queries(&config));

        assert!(queries.contains(&"uae venture capital firms investing in fintech".to_string()));
        assert!(
            queries.contains(&"uae venture capital firms investing in healthtech".to_string())
        );
    }

    #[test]
    fn test_custom_queries_appended_without_duplicates() {
        let config = Config {
            custom_queries: vec![
                "Dubai fintech angels".to_string(),
                "dubai  FINTECH angels".to_string(),
                "  ".to_string(),
            ],
            ..Default::default()
        };
        let queries = plan_queries(&config);

        assert_eq!(queries.last().unwrap().as_str(), "Dubai fintech angels");
        assert_eq!(
            queries
                .iter()
                .filter(|q| normalize(q.as_str()) == "dubai fintech angels")
                .count(),
            1
        );
    }

    #[test]
    fn test_max_queries_truncates() {
        let config = Config {
            max_queries: Some(2),
            ..Default::default()
        };
        assert_eq!(plan_queries(&config).len(), 2);

        let config = Config {
            max_queries: Some(0),
            ..Default::default()
        };
        assert!(plan_queries(&config).is_empty());
    }
}
