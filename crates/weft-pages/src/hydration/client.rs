//! Fixed JavaScript fragments of the hydration script.
//!
//! The generated script is wrapped in an IIFE. [`PRELUDE`] sets up the
//! `window.__weft` namespace and local helpers; the compiler then emits one
//! statement per captured entry inside the `init` function and closes with
//! [`EPILOGUE`].

/// Name of the global namespace object.
pub const NAMESPACE: &str = "__weft";

/// Tags whose state is written to `value` instead of `textContent`.
pub const VALUE_TAGS: &[&str] = &["input", "textarea", "select"];

/// Namespace setup and helpers, followed by the opening of `init`.
///
/// `W.set(key, value)` updates the state map and notifies watchers of `key`;
/// `W.watch(key, fn)` registers a watcher. A failing watcher is logged and
/// does not stop the others.
pub const PRELUDE: &str = concat!(
	"(function(){",
	"\"use strict\";",
	"var W=window.__weft=window.__weft||{};",
	"W.state=W.state||{};",
	"W.watchers=W.watchers||{};",
	"W.set=function(k,v){W.state[k]=v;var l=W.watchers[k]||[];",
	"for(var i=0;i<l.length;i++){try{l[i](v);}catch(e){console.error(\"[weft] watcher failed\",k,e);}}};",
	"W.watch=function(k,f){(W.watchers[k]=W.watchers[k]||[]).push(f);};",
	"var $=function(id){return document.getElementById(id);};",
	"var str=function(v){return v==null?\"\":typeof v===\"object\"?JSON.stringify(v):String(v);};",
	"var txt=function(el,v){if(el)el.textContent=str(v);};",
	"var val=function(el,v){if(el)el.value=str(v);};",
	"var has=function(k){return Object.prototype.hasOwnProperty.call(W.state,k);};",
	"function init(){",
);

/// Closes `init` and runs it once the document is parsed.
pub const EPILOGUE: &str = concat!(
	"}",
	"if(document.readyState===\"loading\"){document.addEventListener(\"DOMContentLoaded\",init);}",
	"else{init();}",
	"})();",
);
