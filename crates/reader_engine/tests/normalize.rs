use pretty_assertions::assert_eq;
use reader_engine::{normalize, pick_srcset_candidate, ExtractedArticle, NormalizeError};

const BASE: &str = "https://example.com/posts/1";

fn article(content: &str) -> ExtractedArticle {
    ExtractedArticle {
        title: "Sample".to_string(),
        content_html: content.to_string(),
        base_url: BASE.to_string(),
    }
}

fn body_of(html: &str) -> &str {
    let start = html.find("</p>\n").map(|i| i + "</p>\n".len()).unwrap();
    let end = html.rfind("\n</article>").unwrap();
    &html[start..end]
}

#[test]
fn plain_markup_passes_through_inside_shell() {
    let doc = normalize(&article("<p>Hello <em>world</em></p>")).unwrap();

    assert!(doc.html.starts_with("<!DOCTYPE html>"));
    assert!(doc.html.contains("<meta charset=\"utf-8\">"));
    assert!(doc.html.contains("<base href=\"https://example.com/posts/1\">"));
    assert!(doc.html.contains("<title>Sample</title>"));
    assert!(doc.html.contains("<h1>Sample</h1>"));
    assert!(doc.html.contains("img, video, svg { max-width: 100%; height: auto; }"));
    assert_eq!(body_of(&doc.html), "<p>Hello <em>world</em></p>");
}

#[test]
fn lazy_data_src_becomes_absolute_src() {
    let doc = normalize(&article(
        r#"<p>Hi</p><img src="" data-src="/img/a.png" alt="A" loading="lazy">"#,
    ))
    .unwrap();

    assert_eq!(
        body_of(&doc.html),
        r#"<p>Hi</p><img src="https://example.com/img/a.png" alt="A">"#
    );
    assert!(!doc.html.contains("data-src"));
}

#[test]
fn lazy_attributes_follow_priority_order() {
    let doc = normalize(&article(
        r#"<img data-original="/second.png" data-lazy-src="/first.png">"#,
    ))
    .unwrap();

    assert_eq!(
        body_of(&doc.html),
        r#"<img src="https://example.com/first.png">"#
    );
}

#[test]
fn srcset_prefers_widest_candidate() {
    let doc = normalize(&article(
        r#"<img srcset="/s.jpg 320w, /l.jpg 1024w, /m.jpg 640w" sizes="100vw">"#,
    ))
    .unwrap();

    assert_eq!(body_of(&doc.html), r#"<img src="https://example.com/l.jpg">"#);
}

#[test]
fn srcset_without_widths_uses_first_candidate() {
    assert_eq!(
        pick_srcset_candidate("a.jpg 1x, b.jpg 2x").as_deref(),
        Some("a.jpg")
    );
    let doc = normalize(&article(r##"<img src="#" data-srcset="a.jpg 1x, b.jpg 2x">"##)).unwrap();
    assert_eq!(
        body_of(&doc.html),
        r#"<img src="https://example.com/posts/a.jpg">"#
    );
}

#[test]
fn noscript_fallback_replaces_placeholder_image() {
    let doc = normalize(&article(
        r#"<p>Lead</p><img class="lazy" src="data:image/gif;base64,R0lGOD">
<noscript><img src="/real.jpg" alt="Real"></noscript><p>Tail</p>"#,
    ))
    .unwrap();

    assert_eq!(
        body_of(&doc.html),
        "<p>Lead</p><img src=\"https://example.com/real.jpg\" alt=\"Real\">\n<p>Tail</p>"
    );
}

#[test]
fn inline_placeholder_is_kept_when_nothing_better_exists() {
    let doc = normalize(&article(r#"<p>x</p><img src="data:image/png;base64,AAAA">"#)).unwrap();
    assert!(doc
        .html
        .contains(r#"<img src="data:image/png;base64,AAAA">"#));
}

#[test]
fn unresolvable_images_are_removed() {
    let doc = normalize(&article(
        r#"<p>Text</p><img src=""><img data-src="javascript:alert(1)"><img src="about:blank">"#,
    ))
    .unwrap();

    assert_eq!(body_of(&doc.html), "<p>Text</p>");
}

#[test]
fn every_remaining_image_is_absolute() {
    let doc = normalize(&article(
        r#"<figure><img src="rel.png"><img data-url="//cdn.example.net/x.png"></figure>
<img src="https://other.example/abs.png"><noscript><img src="/dup.png"></noscript>"#,
    ))
    .unwrap();

    let body = body_of(&doc.html);
    assert!(body.contains(r#"src="https://example.com/posts/rel.png""#));
    assert!(body.contains(r#"src="https://cdn.example.net/x.png""#));
    assert!(body.contains(r#"src="https://other.example/abs.png""#));
    assert!(!body.contains("dup.png"));
    assert!(!body.contains("noscript"));
}

#[test]
fn anchors_resolve_except_fragments_and_scripts() {
    let doc = normalize(&article(
        r##"<p><a href="../other">x</a> <a href="#sec">y</a> <a href="javascript:void(0)">z</a></p>"##,
    ))
    .unwrap();

    assert_eq!(
        body_of(&doc.html),
        r##"<p><a href="https://example.com/other">x</a> <a href="#sec">y</a> <a href="javascript:void(0)">z</a></p>"##
    );
}

#[test]
fn picture_sources_are_resolved_in_place() {
    let doc = normalize(&article(
        r#"<picture><source type="image/webp" srcset="/a.webp 1x, /b.webp 2x"><img src="/a.jpg"></picture>"#,
    ))
    .unwrap();

    assert_eq!(
        body_of(&doc.html),
        r#"<picture><source srcset="https://example.com/a.webp 1x, https://example.com/b.webp 2x" type="image/webp"><img src="https://example.com/a.jpg"></picture>"#
    );
}

#[test]
fn scripts_are_dropped() {
    let doc = normalize(&article(
        r#"<p>Keep</p><script>document.write("x")</script><noscript>Enable JS</noscript>"#,
    ))
    .unwrap();

    assert_eq!(body_of(&doc.html), "<p>Keep</p>");
}

#[test]
fn title_and_text_are_escaped() {
    let mut input = article("<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>");
    input.title = r#"A <b> & "c""#.to_string();
    let doc = normalize(&input).unwrap();

    assert!(doc.html.contains(r#"<title>A &lt;b&gt; &amp; "c"</title>"#));
    assert!(doc.html.contains(r#"<h1>A &lt;b&gt; &amp; "c"</h1>"#));
    assert_eq!(body_of(&doc.html), "<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>");
}

#[test]
fn output_is_deterministic() {
    let input = article(
        r#"<div id="x" class="y" data-a="1"><img alt="p" data-src="a.png" title="t"><a href="b">l</a></div>"#,
    );
    let first = normalize(&input).unwrap();
    let second = normalize(&input).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        body_of(&first.html),
        r#"<div class="y" data-a="1" id="x"><img src="https://example.com/posts/a.png" alt="p" title="t"><a href="https://example.com/posts/b">l</a></div>"#
    );
}

#[test]
fn relative_base_url_is_rejected() {
    let mut input = article("<p>x</p>");
    input.base_url = "/posts/1".to_string();
    assert_eq!(
        normalize(&input),
        Err(NormalizeError::InvalidBaseUrl("/posts/1".to_string()))
    );
}

#[test]
fn nul_bytes_are_rejected() {
    assert_eq!(
        normalize(&article("<p>bad\0byte</p>")),
        Err(NormalizeError::NulByte)
    );
}

#[test]
fn fragment_with_nothing_renderable_is_rejected() {
    assert_eq!(
        normalize(&article(r#"<div><img src=""></div><!-- c -->"#)),
        Err(NormalizeError::NothingRenderable)
    );
}

#[test]
fn non_ascii_image_urls_are_percent_encoded() {
    let doc = normalize(&article(r#"<p>x</p><img src="图片.jpg">"#)).unwrap();
    assert_eq!(
        body_of(&doc.html),
        r#"<p>x</p><img src="https://example.com/posts/%E5%9B%BE%E7%89%87.jpg">"#
    );

    let doc = normalize(&article(r#"<img data-src="사진1.png">"#)).unwrap();
    assert_eq!(
        body_of(&doc.html),
        r#"<img src="https://example.com/posts/%EC%82%AC%EC%A7%841.png">"#
    );

    let doc = normalize(&article(r#"<img srcset="/이미지.jpg 800w">"#)).unwrap();
    assert_eq!(
        body_of(&doc.html),
        r#"<img src="https://example.com/%EC%9D%B4%EB%AF%B8%EC%A7%80.jpg">"#
    );
}
