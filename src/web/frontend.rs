//! Embedded single-page frontend served at `/`.
//!
//! The dashboard loads `/api/analyses` once per visit and keeps that list
//! fixed; search, sort, statistics and charts are then computed in the page
//! with the same rules as `client::dashboard::compute_view`, so typing never
//! reaches the server. Error text is whatever the backend reports.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>clausescope</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; padding-bottom: 12px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 22px; color: var(--accent); }
nav button { margin-left: 8px; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; margin-bottom: 16px; }
textarea, input, select { width: 100%; background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: 8px; font: inherit; }
textarea { min-height: 160px; resize: vertical; }
button { background: var(--accent); color: #0d1117; border: 0; border-radius: 6px; padding: 8px 14px; font-weight: 600; cursor: pointer; }
button:disabled { opacity: .5; cursor: default; }
.row { display: flex; gap: 12px; align-items: center; margin-top: 10px; }
.cols { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.muted { color: var(--text-muted); }
.error { background: rgba(248,81,73,.12); border: 1px solid var(--red); color: var(--red); border-radius: 6px; padding: 10px; margin-bottom: 12px; }
.hidden { display: none; }
.stats { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; }
.stat b { display: block; font-size: 22px; }
.high { color: var(--red); } .medium { color: var(--yellow); } .low { color: var(--green); }
.item { border-top: 1px solid var(--border); padding: 10px 0; cursor: pointer; }
.item:hover { color: var(--accent); }
.bar { display: inline-block; height: 10px; background: var(--accent); border-radius: 3px; vertical-align: middle; }
.modal { position: fixed; inset: 0; background: rgba(0,0,0,.6); display: flex; align-items: flex-start; justify-content: center; padding: 40px; overflow: auto; }
.modal .card { max-width: 900px; width: 100%; }
ul { margin-left: 18px; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>clausescope</h1>
    <nav><button id="nav-analyze">Analyze</button><button id="nav-dashboard">Dashboard</button></nav>
  </header>
  <div id="error" class="error hidden"></div>

  <section id="analyze-view">
    <div class="card">
      <textarea id="clause" placeholder="Paste a contract clause (up to 10000 characters)"></textarea>
      <div class="row">
        <button id="analyze-btn">Analyze</button>
        <span id="loading" class="muted hidden">Analyzing...</span>
        <span id="elapsed" class="muted"></span>
      </div>
    </div>
    <div id="results" class="hidden">
      <div class="cols">
        <div class="card" id="rule-panel"></div>
        <div class="card" id="ai-panel"></div>
      </div>
      <div class="row"><button id="save-btn">Save Analysis</button><span id="saved" class="muted"></span></div>
    </div>
  </section>

  <section id="dashboard-view" class="hidden">
    <div class="card row">
      <input id="search" placeholder="Search title, summary or id">
      <select id="sort">
        <option value="date-desc">Newest first</option>
        <option value="date-asc">Oldest first</option>
        <option value="risk-desc">Highest risk</option>
        <option value="risk-asc">Lowest risk</option>
      </select>
    </div>
    <div class="card stats" id="stats"></div>
    <div class="cols">
      <div class="card"><h3>Risk distribution</h3><div id="risk-chart"></div></div>
      <div class="card"><h3>Activity</h3><div id="activity-chart"></div></div>
    </div>
    <div class="card" id="list"></div>
  </section>
</div>

<div id="modal" class="modal hidden"><div class="card" id="modal-body"></div></div>

<script>
const $ = (id) => document.getElementById(id);
const esc = (s) => String(s ?? '').replace(/[&<>"']/g, (c) => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
let current = null;
let errorTimer = null;
let detailGeneration = 0;
let dashboardGeneration = 0;
let dashboardBase = [];

function showError(message) {
  const box = $('error');
  box.textContent = message;
  box.classList.remove('hidden');
  box.scrollIntoView({ behavior: 'smooth', block: 'nearest' });
  clearTimeout(errorTimer);
  errorTimer = setTimeout(() => box.classList.add('hidden'), 10000);
}

async function request(path, options) {
  const resp = await fetch(path, options);
  const body = await resp.json().catch(() => ({}));
  if (!resp.ok) throw new Error(body.error || `Request failed with status ${resp.status}`);
  return body;
}

function list(items, placeholder) {
  const present = (items || []).filter((i) => String(i).trim());
  return present.length ? '<ul>' + present.map((i) => `<li>${esc(i)}</li>`).join('') + '</ul>' : esc(placeholder);
}

function renderRule(rule) {
  rule = rule || {};
  const score = rule.riskScore ?? rule.risk_score;
  return `<h3>Rule-based</h3>
    <p><b>Type:</b> ${esc(rule.clauseType || 'N/A')}</p>
    <p><b>Risk score:</b> ${score === undefined ? 'N/A' : esc(String(score).split('/')[0] + '/10')}</p>
    <p><b>Flags:</b></p>${list(rule.flags, 'No flags')}
    <p><b>Summary:</b> ${esc(rule.summary || 'No summary available')}</p>`;
}

function renderAi(ai) {
  ai = ai || {};
  if (ai.error) return `<h3>AI-based</h3><p class="high">${esc(ai.error)}</p>`;
  return `<h3>AI-based</h3>
    <p><b>Type:</b> ${esc(ai.clauseType || 'N/A')}</p>
    <p><b>Risk level:</b> ${esc(ai.riskLevel || 'N/A')}</p>
    <p><b>Key terms:</b> ${esc((ai.keyTerms || []).join(', ') || 'N/A')}</p>
    <p><b>Summary:</b> ${esc(ai.summary || 'No summary available')}</p>
    <p><b>Recommendations:</b></p>${list(ai.recommendations, 'No recommendations')}`;
}

async function analyze() {
  const text = $('clause').value.trim();
  if (!text) return showError('Please enter clause text to analyze.');
  if (text.length > 10000) return showError(`Clause text is too long (${text.length} characters). Maximum is 10000 characters.`);

  current = null;
  $('results').classList.add('hidden');
  $('analyze-btn').disabled = true;
  $('loading').classList.remove('hidden');
  const started = performance.now();
  try {
    current = await request('/api/analyze', {
      method: 'POST', headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ clauseText: text }),
    });
    $('rule-panel').innerHTML = renderRule(current.ruleBased);
    $('ai-panel').innerHTML = renderAi(current.aiBased);
    $('elapsed').textContent = `${((performance.now() - started) / 1000).toFixed(1)}s`;
    $('save-btn').disabled = false;
    $('save-btn').textContent = 'Save Analysis';
    $('saved').textContent = '';
    $('results').classList.remove('hidden');
  } catch (e) {
    showError(e.message);
  } finally {
    $('analyze-btn').disabled = false;
    $('loading').classList.add('hidden');
  }
}

async function save() {
  if (!current) return showError('No analysis to save. Analyze a clause first.');
  const btn = $('save-btn');
  if (btn.disabled) return;
  btn.disabled = true;
  btn.textContent = 'Saving...';
  try {
    const saved = await request('/api/save', {
      method: 'POST', headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ analysisData: current }),
    });
    btn.textContent = 'Saved';
    $('saved').textContent = `Saved as ${saved.analysisId}`;
  } catch (e) {
    btn.disabled = false;
    btn.textContent = 'Save Analysis';
    showError(e.message);
  }
}

function bars(series) {
  const max = Math.max(1, ...series.values);
  return series.labels.map((label, i) =>
    `<div>${esc(label)} <span class="bar" style="width:${Math.round(series.values[i] / max * 200)}px"></span> ${series.values[i]}</div>`
  ).join('') || '<p class="muted">No data</p>';
}

const cmp = (x, y) => (x < y ? -1 : x > y ? 1 : 0);

function riskScore(text) {
  const m = /^\s*(\d+)/.exec(String(text ?? ''));
  return m ? Math.min(10, parseInt(m[1], 10)) : 0;
}

function riskBucket(r) {
  if (r.risk === 'High' || r.risk === 'Medium' || r.risk === 'Low') return r.risk;
  return r.score >= 7 ? 'High' : r.score >= 4 ? 'Medium' : 'Low';
}

function dateKey(text) {
  const t = Date.parse(text);
  return Number.isNaN(t) ? -Infinity : t;
}

function dashboardView(base, search, sort) {
  const needle = search.toLowerCase();
  const records = base.filter((r) => !needle
    || r.title.toLowerCase().includes(needle)
    || r.summary.toLowerCase().includes(needle)
    || r.id.toLowerCase().includes(needle));
  const order = {
    'date-desc': (a, b) => cmp(dateKey(b.date), dateKey(a.date)),
    'date-asc': (a, b) => cmp(dateKey(a.date), dateKey(b.date)),
    'risk-desc': (a, b) => b.score - a.score,
    'risk-asc': (a, b) => a.score - b.score,
  }[sort] || ((a, b) => cmp(dateKey(b.date), dateKey(a.date)));
  records.sort(order);

  const stats = { total: records.length, high: 0, medium: 0, low: 0 };
  const perDay = new Map();
  for (const r of records) {
    stats[riskBucket(r).toLowerCase()] += 1;
    perDay.set(r.date, (perDay.get(r.date) || 0) + 1);
  }
  const days = [...perDay.keys()].sort(cmp);
  return {
    records,
    stats,
    riskDistribution: { labels: ['High', 'Medium', 'Low'], values: [stats.high, stats.medium, stats.low] },
    activity: { labels: days, values: days.map((d) => perDay.get(d)) },
  };
}

function renderDashboard() {
  const view = dashboardView(dashboardBase, $('search').value, $('sort').value);
  const s = view.stats;
  $('stats').innerHTML = `<div class="stat">Total<b>${s.total}</b></div>
    <div class="stat high">High<b>${s.high}</b></div>
    <div class="stat medium">Medium<b>${s.medium}</b></div>
    <div class="stat low">Low<b>${s.low}</b></div>`;
  $('risk-chart').innerHTML = bars(view.riskDistribution);
  $('activity-chart').innerHTML = bars(view.activity);
  $('list').innerHTML = view.records.map((r) =>
    `<div class="item" data-id="${esc(r.id)}"><b>${esc(r.title)}</b> <span class="muted">${esc(r.date)} · ${esc(r.risk)} · ${r.score}/10</span><div class="muted">${esc(r.summary)}</div></div>`
  ).join('') || '<p class="muted">No analyses found</p>';
}

async function loadDashboard() {
  const generation = ++dashboardGeneration;
  $('list').innerHTML = '<p class="muted">Loading...</p>';
  try {
    const listing = await request('/api/analyses');
    if (generation !== dashboardGeneration) return;
    dashboardBase = Object.freeze(listing.map((r) => Object.freeze({
      id: String(r.id ?? ''),
      title: String(r.title ?? ''),
      summary: String(r.summary ?? ''),
      risk: String(r.risk ?? ''),
      score: riskScore(r.riskScore),
      date: String(r.date ?? ''),
    })));
    renderDashboard();
  } catch (e) {
    if (generation !== dashboardGeneration) return;
    showError(e.message);
  }
}

async function openDetail(id) {
  const generation = ++detailGeneration;
  $('modal-body').innerHTML = '<p class="muted">Loading...</p>';
  $('modal').classList.remove('hidden');
  let html;
  try {
    const record = await request(`/api/analyses/${encodeURIComponent(id)}`);
    html = `<div class="row"><h3>${esc(id)}</h3><a href="/api/analyses/${encodeURIComponent(id)}/export"><button>Export</button></a><button id="close-btn">Close</button></div>
      <p class="muted">${esc(record.timestamp || 'N/A')}</p>
      <p>${esc(record.clauseText || record.clause_text || 'N/A')}</p>
      <div class="cols"><div class="card">${renderRule(record.ruleBased || record.rule_based)}</div>
      <div class="card">${renderAi(record.aiBased || record.ai_based)}</div></div>`;
  } catch (e) {
    html = `<p class="high">Error loading analysis: ${esc(e.message)}</p><button id="close-btn">Close</button>`;
  }
  if (generation !== detailGeneration) return;
  $('modal-body').innerHTML = html;
  $('close-btn').addEventListener('click', closeDetail);
}

function closeDetail() {
  detailGeneration++;
  $('modal').classList.add('hidden');
  $('modal-body').innerHTML = '';
}

function showView(name) {
  $('analyze-view').classList.toggle('hidden', name !== 'analyze');
  $('dashboard-view').classList.toggle('hidden', name !== 'dashboard');
  if (name === 'dashboard') loadDashboard();
}

$('nav-analyze').addEventListener('click', () => showView('analyze'));
$('nav-dashboard').addEventListener('click', () => showView('dashboard'));
$('analyze-btn').addEventListener('click', analyze);
$('save-btn').addEventListener('click', save);
$('search').addEventListener('input', renderDashboard);
$('sort').addEventListener('change', renderDashboard);
$('list').addEventListener('click', (e) => {
  const item = e.target.closest('.item');
  if (item) openDetail(item.dataset.id);
});
$('modal').addEventListener('click', (e) => { if (e.target === $('modal')) closeDetail(); });
window.addEventListener('offline', () => showError('Network error. Check your internet connection.'));
</script>
</body>
</html>
"##;
