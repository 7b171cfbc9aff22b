use recipe_ai::sanitize;

#[test]
fn test_recipe_blog_page() {
    let html = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="utf-8">
            <title>Best Banana Bread | My Food Blog</title>
            <link rel="stylesheet" href="/style.css">
        </head>
        <body>
            <header>
                <nav><ul><li>Home</li><li>Recipes</li></ul></nav>
            </header>
            <article>
                <h1>Best   Banana Bread</h1>
                <img alt="Sliced banana bread" data-src="https://cdn.example.com/bread.jpg" src="">
                <p>Prep time: <time datetime="PT15M">15 minutes</time></p>
                <h2>Ingredients</h2>
                <ul>
                    <li>3 ripe bananas</li>
                    <li>250 g flour</li>
                </ul>
                <h2>Instructions</h2>
                <ol>
                    <li>Mash the bananas.</li>
                    <li>Fold in the flour and bake.</li>
                </ol>
                <svg><text>icon</text></svg>
                <script type="application/ld+json">{"@type": "Recipe"}</script>
            </article>
            <footer><p>© 2024 My Food Blog</p></footer>
        </body>
        </html>
    "#;

    let text = sanitize(html);

    assert_eq!(
        text,
        [
            "Best Banana Bread",
            "[img] Sliced banana bread | https://cdn.example.com/bread.jpg",
            "Prep time: 15 minutes",
            "15 minutes",
            "Ingredients",
            "3 ripe bananas",
            "250 g flour",
            "Instructions",
            "Mash the bananas.",
            "Fold in the flour and bake.",
        ]
        .join("\n")
    );
}

#[test]
fn test_picture_sources_and_srcset() {
    let html = r#"
        <body>
            <picture>
                <source srcset="/hero.webp 1x">
                <img alt="Hero" srcset="  /hero-small.jpg 480w, /hero-large.jpg 1200w">
            </picture>
        </body>
    "#;

    assert_eq!(sanitize(html), "[img] Hero | /hero-small.jpg");
}

#[test]
fn test_table_cells() {
    let html = "<body><table><tr><th>Calories</th><td>250</td></tr></table></body>";
    assert_eq!(sanitize(html), "Calories\n250");
}

#[test]
fn test_body_without_content_elements() {
    let html = "<html><body><div>Only divs here</div></body></html>";
    assert_eq!(sanitize(html), "");
}
