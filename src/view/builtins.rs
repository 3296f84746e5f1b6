//! Partials every engine registers before loading project partials.
//!
//! `styles` and `scripts` emit tags for the externally supplied
//! `stylesheets`/`javascripts` lists, the view's resolved `assets`, and
//! optional inline blocks. URLs are emitted unescaped; they come from
//! project config and percent-encoded asset file names. A project partial
//! with the same name replaces the built-in one.

use minijinja::Environment;

pub const STYLES_PARTIAL: &str = "styles";
pub const SCRIPTS_PARTIAL: &str = "scripts";

const STYLES_SOURCE: &str = r#"
{%- for href in stylesheets|default([]) %}
<link rel="stylesheet" href="{{ href|safe }}">
{%- endfor %}
{%- for href in assets.css|default([]) %}
<link rel="stylesheet" href="{{ href|safe }}">
{%- endfor %}
{%- for block in inline_styles|default([]) %}
<style>{{ block|safe }}</style>
{%- endfor %}"#;

const SCRIPTS_SOURCE: &str = r#"
{%- for src in javascripts|default([]) %}
<script src="{{ src|safe }}"></script>
{%- endfor %}
{%- for src in assets.js|default([]) %}
<script src="{{ src|safe }}"></script>
{%- endfor %}
{%- for block in inline_scripts|default([]) %}
<script>{{ block|safe }}</script>
{%- endfor %}"#;

pub fn register(env: &mut Environment<'static>) -> Result<(), minijinja::Error> {
    env.add_template(STYLES_PARTIAL, STYLES_SOURCE)?;
    env.add_template(SCRIPTS_PARTIAL, SCRIPTS_SOURCE)?;
    Ok(())
}
