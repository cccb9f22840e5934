// News and social-listening analysis prompt.

use crate::client::RequestOptions;

pub const DEFAULT_QUERY: &str = "春晚 机器 人 Unitree 病毒 视频";
pub const DEFAULT_TOP_N: u8 = 3;
pub const MAX_TOP_N: u8 = 5;

const NEWS_TEMPERATURE: f32 = 0.2;

/// Clamp the requested item count to 1..=5.
pub fn clamp_top_n(top_n: u8) -> u8 {
    top_n.clamp(1, MAX_TOP_N)
}

/// Build the analyst prompt for `query` (a keyword, topic or URL).
pub fn build_news_prompt(query: &str, top_n: u8) -> String {
    let top_n = clamp_top_n(top_n);
    format!(
        r#"你是一位能閱讀最新熱點、擅長中文評論與財經風險分析的助理。
請根據以下關鍵字或連結: "{query}" ，列出大約 {top_n} 個最相關的熱門文章/影片/直播標題（假設目前網路熱度高），
對每一條給出：
1) 中文摘要（簡短2-3句）
2) 涉及的公司或組織（以短句列出）
3) 對相關公司股價或金融產品的潛在影響評估（簡短：正面/中性/負面，並說明原因）
4) 若要追蹤此事件，建議監控哪些關鍵詞或指標（最多3項）

請用中文回覆，條列清晰，保持簡潔（每項不超過 5 行）。"#,
        query = query.trim(),
        top_n = top_n
    )
}

pub fn news_request_options(max_tokens: u32) -> RequestOptions {
    RequestOptions {
        title: Some("News Analysis".to_string()),
        max_tokens,
        temperature: NEWS_TEMPERATURE,
    }
}
