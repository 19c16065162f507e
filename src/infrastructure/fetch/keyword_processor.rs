// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::fetcher::{ContentProcessor, FetchError, FetchedPage, ProcessedContent};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// 分类关键词表，顺序即平分时的优先级
static CATEGORY_KEYWORDS: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            "科技",
            vec![
                "人工智能", "机器学习", "深度学习", "算法", "编程", "软件", "硬件", "互联网",
                "5G", "云计算", "大数据", "区块链", "物联网", "芯片",
            ],
        ),
        (
            "财经",
            vec![
                "股票", "基金", "投资", "金融", "经济", "市场", "银行", "货币", "利率", "通胀",
                "资产", "债券", "期货", "外汇",
            ],
        ),
        (
            "教育",
            vec![
                "学校", "学生", "教师", "课程", "考试", "培训", "教学", "大学", "高考", "中考",
                "留学", "职业教育", "在线教育",
            ],
        ),
        (
            "健康",
            vec![
                "医疗", "健康", "疾病", "治疗", "医院", "医生", "药物", "疫苗", "养生", "保健",
                "营养", "运动", "心理健康",
            ],
        ),
        (
            "娱乐",
            vec![
                "电影", "音乐", "游戏", "明星", "综艺", "演出", "娱乐圈", "网红", "直播",
                "短视频", "影视", "演员", "歌手",
            ],
        ),
        (
            "体育",
            vec![
                "足球", "篮球", "乒乓球", "羽毛球", "网球", "游泳", "田径", "奥运会", "世界杯",
                "运动员", "比赛", "冠军", "体育赛事",
            ],
        ),
        (
            "政策",
            vec![
                "政府", "政策", "法律", "法规", "国家", "部门", "改革", "发展", "规划", "战略",
                "监管", "立法", "执法",
            ],
        ),
        (
            "社会",
            vec![
                "社会", "民生", "城市", "农村", "环境", "交通", "住房", "就业", "养老", "社保",
                "公益", "慈善", "社区",
            ],
        ),
        (
            "文化",
            vec![
                "文化", "艺术", "历史", "文学", "诗歌", "小说", "绘画", "书法", "博物馆",
                "文化遗产", "传统文化", "文化交流",
            ],
        ),
        (
            "国际",
            vec![
                "国际", "外交", "国外", "美国", "欧洲", "亚洲", "联合国", "贸易", "合作", "冲突",
                "全球", "世界",
            ],
        ),
    ]
});

/// 质量指示词，每命中一个质量等级加一
static QUALITY_INDICATORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "原创", "深度", "分析", "研究", "报告", "白皮书", "独家", "专访", "权威", "官方",
    ]
});

static POSITIVE_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "好", "优秀", "成功", "增长", "提升", "创新", "突破", "领先", "优势", "积极", "进步",
        "发展",
    ]
});

static NEGATIVE_WORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "差", "失败", "下降", "问题", "困难", "危机", "风险", "落后", "劣势", "消极", "退步",
        "衰退",
    ]
});

/// 质量等级额外加分的分类
static IMPORTANT_CATEGORIES: [&str; 4] = ["科技", "财经", "政策", "研究"];

/// 无法归类时的兜底分类
const FALLBACK_CATEGORY: &str = "综合";
/// 正文选择器，按优先级排列
const CONTENT_SELECTORS: [&str; 5] = [
    "article",
    "main",
    r#"div[class*="content"]"#,
    r#"div[class*="article"]"#,
    r#"div[class*="post"]"#,
];

/// 基于关键词的内容处理器
///
/// 从HTML页面提取标题和正文，并用关键词表推断分类、
/// 质量等级和情感倾向。
pub struct KeywordProcessor;

impl KeywordProcessor {
    /// 对文本分类
    ///
    /// 统计各分类关键词的出现次数，取得分最高者；没有任何
    /// 命中时返回兜底分类。
    pub fn classify(text: &str) -> &'static str {
        let mut best = (FALLBACK_CATEGORY, 0usize);
        for (category, keywords) in CATEGORY_KEYWORDS.iter() {
            let score: usize = keywords
                .iter()
                .map(|keyword| text.matches(keyword).count() * 2)
                .sum();
            if score > best.1 {
                best = (category, score);
            }
        }
        best.0
    }

    /// 估算内容质量等级（1-5）
    pub fn quality_level(text: &str, category: &str) -> i32 {
        let mut level = 1;
        for indicator in QUALITY_INDICATORS.iter() {
            if text.contains(indicator) {
                level += 1;
            }
        }

        let chars = text.chars().count();
        if chars > 2000 {
            level += 1;
        }
        if chars > 5000 {
            level += 1;
        }

        if IMPORTANT_CATEGORIES.contains(&category) {
            level += 1;
        }

        level.min(5)
    }

    /// 估算情感倾向（[-1.0, 1.0]，保留两位小数）
    pub fn sentiment(text: &str) -> f64 {
        let positive: usize = POSITIVE_WORDS
            .iter()
            .map(|word| text.matches(word).count())
            .sum();
        let negative: usize = NEGATIVE_WORDS
            .iter()
            .map(|word| text.matches(word).count())
            .sum();

        let total = positive + negative;
        if total == 0 {
            return 0.0;
        }
        let score = (positive as f64 - negative as f64) / total as f64;
        (score * 100.0).round() / 100.0
    }

    /// 同步完成整个分析流程，避免在异步帧中持有非Send的Html
    fn analyze(page: &FetchedPage) -> Result<ProcessedContent, FetchError> {
        let document = Html::parse_document(&page.content);

        let title = extract_title(&document);
        let content = extract_content(&document);
        if content.trim().is_empty() {
            return Err(FetchError::EmptyContent(page.url.clone()));
        }

        let full_text = format!("{} {}", title, content);
        let category = Self::classify(&full_text);
        let quality = Self::quality_level(&full_text, category);
        let sentiment = Self::sentiment(&full_text);

        Ok(ProcessedContent {
            title,
            content,
            category: Some(category.to_string()),
            sentiment: Some(sentiment),
            quality_level: Some(quality),
        })
    }
}

#[async_trait]
impl ContentProcessor for KeywordProcessor {
    async fn process(&self, page: &FetchedPage) -> Result<ProcessedContent, FetchError> {
        Self::analyze(page)
    }

    async fn reprocess(
        &self,
        title: &str,
        content: Option<&str>,
    ) -> Result<ProcessedContent, FetchError> {
        let content = content.unwrap_or_default();
        let full_text = format!("{} {}", title, content);
        let category = Self::classify(&full_text);
        let quality = Self::quality_level(&full_text, category);
        let sentiment = Self::sentiment(&full_text);

        Ok(ProcessedContent {
            title: title.to_string(),
            content: content.to_string(),
            category: Some(category.to_string()),
            sentiment: Some(sentiment),
            quality_level: Some(quality),
        })
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// 提取标题
///
/// og:title优先，其次h1、title、h2，都没有时用占位标题。
fn extract_title(document: &Html) -> String {
    if let Ok(selector) = Selector::parse(r#"meta[property="og:title"]"#) {
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    for selector_str in ["h1", "title", "h2"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(element);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    "Untitled".to_string()
}

/// 提取正文
///
/// 优先取语义化正文容器；找不到时拼接所有段落（过短则放弃）；
/// 最后退化为整页文本。
fn extract_content(document: &Html) -> String {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(element);
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("p") {
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            let joined = paragraphs.join("\n");
            if joined.chars().count() > 100 {
                return joined;
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return element_text(body);
        }
    }
    String::new()
}

/// 收集元素下的可见文本，跳过script和style
fn element_text(element: ElementRef) -> String {
    let mut fragments = Vec::new();
    collect_text(element, &mut fragments);
    fragments.join("\n")
}

fn collect_text(element: ElementRef, fragments: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if name == "script" || name == "style" {
                continue;
            }
            collect_text(child_element, fragments);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                fragments.push(trimmed.to_string());
            }
        }
    }
}
