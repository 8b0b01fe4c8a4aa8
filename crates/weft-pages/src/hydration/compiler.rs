//! Turns a filled [`RenderContext`] into the hydration script.

use super::client::{EPILOGUE, PRELUDE, VALUE_TAGS};
use crate::logging::dev_warn;
use crate::ssr::RenderContext;
use serde_json::Value;
use weft_core::escape::escape_json_for_script;
use weft_core::script::{ClientScript, ScriptLimits};
use weft_core::settings::RenderSettings;

/// Compiles the hydration script for one render.
///
/// Returns an empty string when the context holds no states, computed
/// scripts, bindings or events. Otherwise the script initializes states,
/// then computed values, then bindings, then event listeners.
///
/// # Examples
///
/// ```
/// use weft_core::RenderSettings;
/// use weft_pages::hydration::compile;
/// use weft_pages::ssr::RenderContext;
///
/// let context = RenderContext::new();
/// assert_eq!(compile(&context, &RenderSettings::default()), "");
/// ```
pub fn compile(context: &RenderContext, settings: &RenderSettings) -> String {
	if context.is_static() {
		return String::new();
	}

	let limits = settings.script_limits();
	let mut script = String::with_capacity(PRELUDE.len() + EPILOGUE.len() + 256);
	script.push_str(PRELUDE);

	for entry in &context.states {
		let id = js_string(&entry.id);
		let setter = if VALUE_TAGS.contains(&entry.tag.as_str()) {
			"val"
		} else {
			"txt"
		};
		script.push_str(&format!(
			"W.state[{id}]={value};{setter}($({id}),W.state[{id}]);",
			value = js_value(&entry.value),
		));
	}

	for entry in &context.computed {
		let id = js_string(&entry.id);
		script.push_str(&format!(
			"try{{txt($({id}),({source})(W.state));}}catch(e){{console.error(\"[weft] computed failed\",{id},e);}}",
			source = entry.source,
		));
	}

	for entry in &context.state_bindings {
		let id = js_string(&entry.node_id);
		let key = js_string(&entry.state_key);
		script.push_str(&format!(
			concat!(
				"(function(el,f){{",
				"W.watch({key},function(v){{txt(el,f(v));}});",
				"if(has({key})){{try{{txt(el,f(W.state[{key}]));}}catch(e){{console.error(\"[weft] binding failed\",{id},e);}}}}",
				"}})($({id}),({source}));",
			),
			key = key,
			id = id,
			source = entry.source,
		));
	}

	for entry in &context.events {
		let Some(source) = event_source(entry.source.as_str(), entry.target_id.as_deref(), &limits)
		else {
			dev_warn!(
				settings,
				node_id = %entry.node_id,
				event = %entry.event,
				"event listener dropped after target substitution"
			);
			continue;
		};
		script.push_str(&format!(
			"(function(el,f){{if(el)el.addEventListener({event},function(e){{return f.call(el,e,W);}});}})($({id}),({source}));",
			event = js_string(&entry.event),
			id = js_string(&entry.node_id),
		));
	}

	script.push_str(EPILOGUE);
	script
}

/// Substitutes the target id into an event source and validates the result.
fn event_source(source: &str, target_id: Option<&str>, limits: &ScriptLimits) -> Option<String> {
	let script = ClientScript::event(source);
	let Some(target_id) = target_id else {
		return script.validate(limits).is_ok().then(|| source.to_string());
	};
	let substituted = ClientScript::event(script.substituted(target_id));
	substituted
		.validate(limits)
		.is_ok()
		.then(|| substituted.source().to_string())
}

/// A JSON string literal safe to embed in a script element.
fn js_string(s: &str) -> String {
	js_value(&Value::String(s.to_string()))
}

fn js_value(value: &Value) -> String {
	escape_json_for_script(&value.to_string())
}
